//! Transfer flow: create, upload parts, finalize

use crate::error::{Error, Result};
use crate::file::{FileAnnouncement, FileDescriptor};
use crate::http::HttpGateway;
use crate::plan::{Multipart, UploadPlan};
use crate::session::Session;
use crate::uploader::{PartUploadStrategy, PlannedFile};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

#[derive(Debug, Serialize)]
struct CreateTransferRequest<'a> {
    message: &'a str,
    files: Vec<FileAnnouncement<'a>>,
}

#[derive(Debug, Deserialize)]
struct CreatedTransfer {
    id: String,
    files: Vec<RemoteFile>,
}

/// File entry of a creation response, carrying its upload plan
#[derive(Debug, Deserialize)]
pub(crate) struct RemoteFile {
    pub id: String,
    pub multipart: Multipart,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UrlResponse {
    pub url: String,
}

/// Remote transfer record; sealed once finalized
#[derive(Debug, Clone)]
pub struct TransferResource {
    pub remote_transfer_id: String,
    pub message: String,
    pub files: Vec<PlannedFile>,
    finalized: bool,
}

impl TransferResource {
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

/// Pair submitted files with returned plans by position.
///
/// A count mismatch breaks the API contract and is never truncated away.
pub(crate) fn pair_plans(
    descriptors: Vec<FileDescriptor>,
    remote_files: Vec<RemoteFile>,
) -> Result<Vec<PlannedFile>> {
    if descriptors.len() != remote_files.len() {
        return Err(Error::Protocol(format!(
            "submitted {} files but received {} upload plans",
            descriptors.len(),
            remote_files.len()
        )));
    }

    descriptors
        .into_iter()
        .zip(remote_files)
        .map(|(descriptor, remote)| {
            let plan = UploadPlan::from_multipart(remote.id, remote.multipart)?;
            Ok(PlannedFile { descriptor, plan })
        })
        .collect()
}

/// Create a transfer describing `files`
pub async fn create_transfer(
    gateway: &HttpGateway,
    session: &Session,
    message: &str,
    files: Vec<FileDescriptor>,
) -> Result<TransferResource> {
    let response = {
        let request = CreateTransferRequest {
            message,
            files: files.iter().map(FileDescriptor::announcement).collect(),
        };
        gateway.post(session, "transfers", &request).await?
    };
    let created: CreatedTransfer = response
        .expect_status(StatusCode::CREATED)
        .and_then(|r| r.json())
        .map_err(Error::ResourceCreation)?;

    let files = pair_plans(files, created.files)?;
    info!(transfer = %created.id, files = files.len(), "transfer created");

    Ok(TransferResource {
        remote_transfer_id: created.id,
        message: message.to_string(),
        files,
        finalized: false,
    })
}

/// Finalize the transfer and return its shareable URL
pub async fn finalize_transfer(
    gateway: &HttpGateway,
    session: &Session,
    transfer: &mut TransferResource,
) -> Result<String> {
    if transfer.finalized {
        return Err(Error::AlreadyFinalized(transfer.remote_transfer_id.clone()));
    }

    let path = format!("transfers/{}/finalize", transfer.remote_transfer_id);
    let finalized: UrlResponse = gateway
        .put_empty(session, &path)
        .await?
        .expect_status(StatusCode::OK)
        .and_then(|r| r.json())
        .map_err(Error::Finalization)?;

    transfer.finalized = true;
    info!(transfer = %transfer.remote_transfer_id, url = %finalized.url, "transfer finalized");

    Ok(finalized.url)
}

/// Part endpoints of a v2 transfer
pub struct TransferParts<'a> {
    gateway: &'a HttpGateway,
    session: &'a Session,
    transfer_id: &'a str,
}

impl<'a> TransferParts<'a> {
    pub fn new(gateway: &'a HttpGateway, session: &'a Session, transfer_id: &'a str) -> Self {
        Self {
            gateway,
            session,
            transfer_id,
        }
    }
}

#[async_trait]
impl PartUploadStrategy for TransferParts<'_> {
    async fn part_url(&self, file: &PlannedFile, part_number: u64) -> Result<String> {
        let path = format!(
            "transfers/{}/files/{}/upload-url/{}",
            self.transfer_id, file.plan.remote_file_id, part_number
        );
        let url: UrlResponse = self
            .gateway
            .get(self.session, &path)
            .await?
            .expect_status(StatusCode::OK)
            .and_then(|r| r.json())
            .map_err(Error::Upload)?;

        Ok(url.url)
    }

    async fn complete_file(&self, file: &PlannedFile, part_count: u64) -> Result<()> {
        let path = format!(
            "transfers/{}/files/{}/upload-complete",
            self.transfer_id, file.plan.remote_file_id
        );
        self.gateway
            .put(self.session, &path, &json!({ "part_numbers": part_count }))
            .await?
            .expect_status(StatusCode::OK)
            .map_err(Error::Finalization)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn descriptor(name: &str, size: u64) -> FileDescriptor {
        FileDescriptor {
            local_path: PathBuf::from(name),
            display_name: name.to_string(),
            byte_size: size,
            mime_type: "application/octet-stream".to_string(),
        }
    }

    fn remote(id: &str, parts: u64, chunk: u64) -> RemoteFile {
        RemoteFile {
            id: id.to_string(),
            multipart: Multipart {
                part_numbers: parts,
                chunk_size: chunk,
                id: None,
            },
        }
    }

    #[test]
    fn test_pair_plans_by_position() {
        let paired = pair_plans(
            vec![descriptor("a.txt", 10), descriptor("b.txt", 20)],
            vec![remote("fa", 1, 16), remote("fb", 2, 16)],
        )
        .unwrap();

        assert_eq!(paired[0].descriptor.display_name, "a.txt");
        assert_eq!(paired[0].plan.remote_file_id, "fa");
        assert_eq!(paired[1].descriptor.display_name, "b.txt");
        assert_eq!(paired[1].plan.total_part_count, 2);
    }

    #[test]
    fn test_pair_plans_rejects_fewer_plans() {
        let err = pair_plans(
            vec![descriptor("a.txt", 10), descriptor("b.txt", 20)],
            vec![remote("fa", 1, 16)],
        )
        .unwrap_err();

        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_pair_plans_rejects_extra_plans() {
        let err = pair_plans(
            vec![descriptor("a.txt", 10)],
            vec![remote("fa", 1, 16), remote("fb", 1, 16)],
        )
        .unwrap_err();

        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_create_request_shape() {
        let files = [descriptor("a.txt", 10)];
        let request = CreateTransferRequest {
            message: "hello",
            files: files.iter().map(FileDescriptor::announcement).collect(),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"message": "hello", "files": [{"name": "a.txt", "size": 10}]})
        );
    }
}
