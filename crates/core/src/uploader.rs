//! Chunked upload orchestration.
//!
//! Each file is read sequentially; for every chunk a presigned URL is
//! requested for the next 1-based part number, the chunk is PUT to that URL,
//! and once the file is exhausted the service is told how many parts were
//! sent. Where the URLs come from and how completion is reported depends on
//! the flow (transfer, board or email), which plugs in through
//! [`PartUploadStrategy`].

use crate::error::{Error, Result};
use crate::file::FileDescriptor;
use crate::http::HttpGateway;
use crate::plan::{ChunkReader, UploadPlan};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// A local file paired with the plan the service returned for it
#[derive(Debug, Clone)]
pub struct PlannedFile {
    pub descriptor: FileDescriptor,
    pub plan: UploadPlan,
}

/// What to do when the parts sent differ from the plan's part count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchPolicy {
    /// Fail with `PartCountMismatch`
    Reject,
    /// Log the drift and report the plan's count
    ReportPlanned,
}

/// Flow-specific endpoints used by [`ChunkedUploader`]
#[async_trait]
pub trait PartUploadStrategy: Send + Sync {
    /// Presigned URL for one part of `file`
    async fn part_url(&self, file: &PlannedFile, part_number: u64) -> Result<String>;

    /// Tell the service that `file` is fully uploaded in `part_count` parts
    async fn complete_file(&self, file: &PlannedFile, part_count: u64) -> Result<()>;

    fn mismatch_policy(&self) -> MismatchPolicy {
        MismatchPolicy::Reject
    }
}

/// Result of uploading one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileUploadReport {
    pub parts_sent: u64,
    pub parts_reported: u64,
    pub bytes_sent: u64,
}

/// Drives the per-file chunk loop against a strategy
pub struct ChunkedUploader<'a, S: PartUploadStrategy + ?Sized> {
    storage: &'a HttpGateway,
    strategy: &'a S,
}

impl<'a, S: PartUploadStrategy + ?Sized> ChunkedUploader<'a, S> {
    pub fn new(storage: &'a HttpGateway, strategy: &'a S) -> Self {
        Self { storage, strategy }
    }

    /// Upload every file in order, one after the other
    pub async fn upload_all(&self, files: &[PlannedFile]) -> Result<Vec<FileUploadReport>> {
        let mut reports = Vec::with_capacity(files.len());
        for file in files {
            reports.push(self.upload(file).await?);
        }
        Ok(reports)
    }

    /// Upload one file chunk by chunk, then report completion
    pub async fn upload(&self, file: &PlannedFile) -> Result<FileUploadReport> {
        let name = &file.descriptor.display_name;
        debug!(
            file = %name,
            size = file.descriptor.byte_size,
            chunk_size = file.plan.chunk_size,
            planned_parts = file.plan.total_part_count,
            "starting chunked upload"
        );

        let (parts_sent, bytes_sent) = self.send_chunks(file).await?;

        if bytes_sent != file.descriptor.byte_size {
            return Err(Error::Upload(format!(
                "{} changed during upload: declared {} bytes, read {}",
                name, file.descriptor.byte_size, bytes_sent
            )));
        }

        let parts_reported = if parts_sent == file.plan.total_part_count {
            parts_sent
        } else {
            match self.strategy.mismatch_policy() {
                MismatchPolicy::Reject => {
                    return Err(Error::PartCountMismatch {
                        file: name.clone(),
                        expected: file.plan.total_part_count,
                        sent: parts_sent,
                    });
                }
                MismatchPolicy::ReportPlanned => {
                    warn!(
                        file = %name,
                        planned = file.plan.total_part_count,
                        sent = parts_sent,
                        "part count drift, reporting the planned count"
                    );
                    file.plan.total_part_count
                }
            }
        };

        self.strategy.complete_file(file, parts_reported).await?;
        info!(file = %name, parts = parts_sent, bytes = bytes_sent, "file upload complete");

        Ok(FileUploadReport {
            parts_sent,
            parts_reported,
            bytes_sent,
        })
    }

    // The reader, and with it the file handle, is dropped when this returns.
    async fn send_chunks(&self, file: &PlannedFile) -> Result<(u64, u64)> {
        let mut reader = ChunkReader::open(&file.descriptor.local_path, file.plan.chunk_size).await?;

        while let Some(chunk) = reader.next_chunk().await? {
            let url = self.strategy.part_url(file, chunk.part_number).await?;
            debug!(
                file = %file.descriptor.display_name,
                part = chunk.part_number,
                bytes = chunk.data.len(),
                "uploading part"
            );
            self.storage.put_presigned(&url, chunk.data).await?;
        }

        Ok((reader.parts_read(), reader.bytes_read()))
    }
}
