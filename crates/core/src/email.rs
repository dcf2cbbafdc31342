//! Email delivery through the private, unversioned v4 API.
//!
//! This surface is not part of the public API contract and may change or be
//! withdrawn at any time; its use may be against the service's terms. It is
//! kept separate from the v2 flows and only plugs into the shared chunked
//! uploader through [`EmailParts`].

use crate::error::{Error, Result};
use crate::file::{FileAnnouncement, FileDescriptor};
use crate::http::HttpGateway;
use crate::plan::{PartCountRule, UploadPlan};
use crate::session::Session;
use crate::transfer::UrlResponse;
use crate::uploader::{ChunkedUploader, MismatchPolicy, PartUploadStrategy, PlannedFile};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

/// Checksum sent with every part request; the service does not validate it
pub const PLACEHOLDER_CHUNK_CRC: u64 = 888_888_888;

/// Sender and recipients of an email transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDelivery {
    pub sender: String,
    pub recipients: Vec<String>,
    pub language: String,
}

impl EmailDelivery {
    pub fn new(sender: impl Into<String>, recipients: Vec<String>) -> Self {
        Self {
            sender: sender.into(),
            recipients,
            language: "en".to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct CreateEmailTransferRequest<'a> {
    recipients: &'a [String],
    message: &'a str,
    from: &'a str,
    ui_language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain_user_id: Option<&'a str>,
    files: Vec<FileAnnouncement<'a>>,
}

#[derive(Debug, Deserialize)]
struct CreatedEmailTransfer {
    id: String,
    files: Vec<EmailFile>,
}

#[derive(Debug, Deserialize)]
struct EmailFile {
    id: String,
    chunk_size: u64,
}

#[derive(Debug, Deserialize)]
struct ShortenedUrl {
    shortened_url: String,
}

/// Part endpoints of a v4 email transfer
pub struct EmailParts<'a> {
    gateway: &'a HttpGateway,
    session: &'a Session,
    transfer_id: &'a str,
    rule: PartCountRule,
}

impl<'a> EmailParts<'a> {
    pub fn new(
        gateway: &'a HttpGateway,
        session: &'a Session,
        transfer_id: &'a str,
        rule: PartCountRule,
    ) -> Self {
        Self {
            gateway,
            session,
            transfer_id,
            rule,
        }
    }
}

#[async_trait]
impl PartUploadStrategy for EmailParts<'_> {
    async fn part_url(&self, file: &PlannedFile, part_number: u64) -> Result<String> {
        let path = format!(
            "transfers/{}/files/{}/part-put-url",
            self.transfer_id, file.plan.remote_file_id
        );
        let body = json!({
            "chunk_number": part_number,
            "chunk_size": file.plan.chunk_size,
            "chunk_crc": PLACEHOLDER_CHUNK_CRC,
            "retries": 0,
        });
        let url: UrlResponse = self
            .gateway
            .post(self.session, &path, &body)
            .await?
            .expect_success()
            .and_then(|r| r.json())
            .map_err(Error::Upload)?;

        Ok(url.url)
    }

    async fn complete_file(&self, file: &PlannedFile, part_count: u64) -> Result<()> {
        let path = format!(
            "transfers/{}/files/{}/finalize-mpp",
            self.transfer_id, file.plan.remote_file_id
        );
        self.gateway
            .put(self.session, &path, &json!({ "chunk_count": part_count }))
            .await?
            .expect_success()
            .map_err(Error::Finalization)?;

        Ok(())
    }

    fn mismatch_policy(&self) -> MismatchPolicy {
        match self.rule {
            PartCountRule::Exact => MismatchPolicy::Reject,
            PartCountRule::Legacy => MismatchPolicy::ReportPlanned,
        }
    }
}

/// Create, upload and finalize an email transfer; returns the shortened URL.
///
/// `gateway` must be rooted at the private v4 API.
pub async fn send_email_transfer(
    gateway: &HttpGateway,
    session: &Session,
    delivery: &EmailDelivery,
    rule: PartCountRule,
    message: &str,
    files: Vec<FileDescriptor>,
) -> Result<String> {
    warn!("email delivery uses the private WeTransfer v4 API, which is undocumented and may break");

    let response = {
        let request = CreateEmailTransferRequest {
            recipients: &delivery.recipients,
            message,
            from: &delivery.sender,
            ui_language: &delivery.language,
            domain_user_id: session.user_identifier(),
            files: files.iter().map(FileDescriptor::announcement).collect(),
        };
        gateway.post(session, "transfers/email", &request).await?
    };
    let created: CreatedEmailTransfer = response
        .expect_success()
        .and_then(|r| r.json())
        .map_err(Error::ResourceCreation)?;

    if created.files.len() != files.len() {
        return Err(Error::Protocol(format!(
            "submitted {} files but received {} file entries",
            files.len(),
            created.files.len()
        )));
    }
    info!(transfer = %created.id, files = files.len(), "email transfer created");

    let strategy = EmailParts::new(gateway, session, &created.id, rule);
    let uploader = ChunkedUploader::new(gateway, &strategy);

    let mut total_parts = 0;
    for descriptor in files {
        // Parts go under the registered file, so its chunk size is the one that applies
        let registered = register_file(gateway, session, &created.id, &descriptor).await?;
        if registered.chunk_size == 0 {
            return Err(Error::Protocol(format!(
                "email file {} has a zero chunk size",
                registered.id
            )));
        }

        let plan = UploadPlan {
            total_part_count: rule.part_count(descriptor.byte_size, registered.chunk_size),
            remote_file_id: registered.id,
            chunk_size: registered.chunk_size,
            multipart_upload_id: None,
        };
        let report = uploader.upload(&PlannedFile { descriptor, plan }).await?;
        total_parts += report.parts_reported;
    }

    finalize(gateway, session, &created.id, total_parts).await
}

/// Register one file on the transfer; its parts are uploaded under the returned id
async fn register_file(
    gateway: &HttpGateway,
    session: &Session,
    transfer_id: &str,
    descriptor: &FileDescriptor,
) -> Result<EmailFile> {
    let registered: EmailFile = gateway
        .post(
            session,
            &format!("transfers/{}/files", transfer_id),
            &descriptor.announcement(),
        )
        .await?
        .expect_success()
        .and_then(|r| r.json())
        .map_err(Error::ResourceCreation)?;

    Ok(registered)
}

async fn finalize(
    gateway: &HttpGateway,
    session: &Session,
    transfer_id: &str,
    chunk_count: u64,
) -> Result<String> {
    let finalized: ShortenedUrl = gateway
        .put(
            session,
            &format!("transfers/{}/finalize", transfer_id),
            &json!({ "chunk_count": chunk_count }),
        )
        .await?
        .expect_success()
        .and_then(|r| r.json())
        .map_err(Error::Finalization)?;

    info!(transfer = %transfer_id, url = %finalized.shortened_url, "email transfer finalized");
    Ok(finalized.shortened_url)
}
