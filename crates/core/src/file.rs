//! Local file descriptors

use crate::error::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// Leading bytes inspected for a content signature
const SNIFF_LEN: u64 = 8192;

/// A local file about to be uploaded; read-only once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub local_path: PathBuf,
    pub display_name: String,
    pub byte_size: u64,
    pub mime_type: String,
}

impl FileDescriptor {
    /// Derive name, size and MIME type from the filesystem
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            Error::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
        })?;

        if !metadata.is_file() {
            return Err(Error::InvalidInput(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::InvalidInput(format!("{} has no file name", path.display())))?;

        let mime_type = match sniff_mime(path).await? {
            Some(mime) => mime.to_string(),
            None => mime_guess::from_path(path)
                .first_or_octet_stream()
                .to_string(),
        };

        Ok(Self {
            local_path: path.to_path_buf(),
            display_name,
            byte_size: metadata.len(),
            mime_type,
        })
    }

    /// Name and size as announced to the API
    pub fn announcement(&self) -> FileAnnouncement<'_> {
        FileAnnouncement {
            name: &self.display_name,
            size: self.byte_size,
        }
    }
}

/// `{"name", "size"}` entry of transfer, board and email creation requests
#[derive(Debug, Serialize)]
pub struct FileAnnouncement<'a> {
    pub name: &'a str,
    pub size: u64,
}

/// MIME type from the content signature, when there is a known one
async fn sniff_mime(path: &Path) -> Result<Option<&'static str>> {
    let mut head = Vec::new();
    tokio::fs::File::open(path)
        .await?
        .take(SNIFF_LEN)
        .read_to_end(&mut head)
        .await?;

    Ok(infer::get(&head).map(|kind| kind.mime_type()))
}

/// Describe every path, in order
pub async fn describe_all<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<FileDescriptor>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(FileDescriptor::from_path(path).await?);
    }
    Ok(files)
}
