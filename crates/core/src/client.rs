//! WeTransfer client: transfers, boards and email delivery

use crate::board::{self, Board, Link};
use crate::config::{ConfigFile, DEFAULT_ENDPOINT, DEFAULT_PRIVATE_ENDPOINT};
use crate::email::{self, EmailDelivery};
use crate::error::{Error, Result};
use crate::file::describe_all;
use crate::http::HttpGateway;
use crate::plan::PartCountRule;
use crate::session::Session;
use crate::transfer::{self, TransferParts};
use crate::uploader::ChunkedUploader;
use std::path::Path;
use std::time::Duration;

/// Per-instance client settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub user_identifier: Option<String>,
    pub endpoint: String,
    pub private_endpoint: String,
    pub timeout: Duration,
    pub log_http_bodies: bool,
    pub part_count_rule: PartCountRule,
    pub email: Option<EmailDelivery>,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            user_identifier: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            private_endpoint: DEFAULT_PRIVATE_ENDPOINT.to_string(),
            timeout: Duration::from_secs(60),
            log_http_bodies: false,
            part_count_rule: PartCountRule::Exact,
            email: None,
        }
    }

    pub fn with_user_identifier(mut self, user_identifier: impl Into<String>) -> Self {
        self.user_identifier = Some(user_identifier.into());
        self
    }

    /// Public API root, without the version segment
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Private API root, without the version segment
    pub fn with_private_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.private_endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_http_body_logging(mut self, enabled: bool) -> Self {
        self.log_http_bodies = enabled;
        self
    }

    pub fn with_part_count_rule(mut self, rule: PartCountRule) -> Self {
        self.part_count_rule = rule;
        self
    }

    /// Send uploads to recipients through the private v4 API
    pub fn with_email(mut self, delivery: EmailDelivery) -> Self {
        self.email = Some(delivery);
        self
    }
}

impl From<&ConfigFile> for ClientConfig {
    fn from(file: &ConfigFile) -> Self {
        let mut config = ClientConfig::new(file.api.api_key.clone())
            .with_endpoint(file.api.endpoint.clone())
            .with_private_endpoint(file.api.private_endpoint.clone());

        config.user_identifier = file.api.user_identifier.clone();

        if let Some(advanced) = &file.advanced {
            config.timeout = Duration::from_secs(advanced.timeout);
            config.log_http_bodies = advanced.log_http_bodies;
            if advanced.legacy_part_count {
                config.part_count_rule = PartCountRule::Legacy;
            }
        }

        if let Some(email) = &file.email {
            config.email = Some(
                EmailDelivery::new(email.sender.clone(), email.recipients.clone())
                    .with_language(email.language.clone()),
            );
        }

        config
    }
}

/// Client for one API key
pub struct WeTransferClient {
    api: HttpGateway,
    private_api: HttpGateway,
    session: Session,
    email: Option<EmailDelivery>,
    part_count_rule: PartCountRule,
}

impl WeTransferClient {
    /// Build an unauthenticated client; no network call is made
    pub fn new(config: ClientConfig) -> Result<Self> {
        let endpoint = config.endpoint.trim_end_matches('/');
        let private_endpoint = config.private_endpoint.trim_end_matches('/');

        let api = HttpGateway::new(
            format!("{}/v2", endpoint),
            config.timeout,
            config.log_http_bodies,
        )?;
        let private_api = HttpGateway::new(
            format!("{}/v4", private_endpoint),
            config.timeout,
            config.log_http_bodies,
        )?;

        Ok(Self {
            api,
            private_api,
            session: Session::new(config.api_key, config.user_identifier),
            email: config.email,
            part_count_rule: config.part_count_rule,
        })
    }

    /// Build a client and authorize it
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let client = Self::new(config)?;
        client.authorize().await?;
        Ok(client)
    }

    pub async fn authorize(&self) -> Result<()> {
        self.session.authorize(&self.api).await
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn email_delivery(&self) -> Option<&EmailDelivery> {
        self.email.as_ref()
    }

    /// Upload one file and return its download URL
    pub async fn upload_file(&self, path: impl AsRef<Path>, message: &str) -> Result<String> {
        self.upload_files(&[path.as_ref()], message).await
    }

    /// Upload files as a single transfer and return its download URL
    pub async fn upload_files<P: AsRef<Path>>(&self, paths: &[P], message: &str) -> Result<String> {
        if paths.is_empty() {
            return Err(Error::InvalidInput("no files to upload".to_string()));
        }
        self.session.bearer()?;

        let files = describe_all(paths).await?;

        if let Some(delivery) = &self.email {
            return email::send_email_transfer(
                &self.private_api,
                &self.session,
                delivery,
                self.part_count_rule,
                message,
                files,
            )
            .await;
        }

        let mut transfer = transfer::create_transfer(&self.api, &self.session, message, files).await?;

        let strategy = TransferParts::new(&self.api, &self.session, &transfer.remote_transfer_id);
        ChunkedUploader::new(&self.api, &strategy)
            .upload_all(&transfer.files)
            .await?;

        transfer::finalize_transfer(&self.api, &self.session, &mut transfer).await
    }

    pub async fn create_board(&self, name: &str) -> Result<Board> {
        board::create_board(&self.api, &self.session, name).await
    }

    pub async fn get_board(&self, board_id: &str) -> Result<Board> {
        board::get_board(&self.api, &self.session, board_id).await
    }

    pub async fn add_files_to_board<P: AsRef<Path>>(&self, board_id: &str, paths: &[P]) -> Result<Board> {
        board::add_files_to_board(&self.api, &self.session, board_id, paths).await
    }

    pub async fn add_links_to_board(&self, board_id: &str, links: &[Link]) -> Result<Board> {
        board::add_links_to_board(&self.api, &self.session, board_id, links).await
    }
}
