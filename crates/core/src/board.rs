//! Board flow: boards group files and links and are fetched rather than finalized

use crate::error::{Error, Result};
use crate::file::{describe_all, FileDescriptor};
use crate::http::HttpGateway;
use crate::session::Session;
use crate::transfer::{pair_plans, RemoteFile, UrlResponse};
use crate::uploader::{ChunkedUploader, PartUploadStrategy, PlannedFile};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use tracing::info;

/// Board as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub items: Vec<BoardItem>,
}

impl Board {
    pub fn files(&self) -> impl Iterator<Item = &BoardItem> {
        self.items.iter().filter(|i| i.kind == ItemKind::File)
    }

    pub fn links(&self) -> impl Iterator<Item = &BoardItem> {
        self.items.iter().filter(|i| i.kind == ItemKind::Link)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Link,
    #[serde(other)]
    Other,
}

/// A file or link on a board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<LinkMeta>,
}

impl BoardItem {
    /// Link title, or the file name
    pub fn label(&self) -> &str {
        self.meta
            .as_ref()
            .and_then(|m| m.title.as_deref())
            .or(self.name.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkMeta {
    #[serde(default)]
    pub title: Option<String>,
}

/// Link to add to a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub title: String,
}

impl Link {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// Create an empty board
pub async fn create_board(gateway: &HttpGateway, session: &Session, name: &str) -> Result<Board> {
    let board: Board = gateway
        .post(session, "boards", &json!({ "name": name }))
        .await?
        .expect_status(StatusCode::CREATED)
        .and_then(|r| r.json())
        .map_err(Error::ResourceCreation)?;

    info!(board = %board.id, "board created");
    Ok(board)
}

/// Fetch a board with its items
pub async fn get_board(gateway: &HttpGateway, session: &Session, board_id: &str) -> Result<Board> {
    gateway
        .get(session, &format!("boards/{}", board_id))
        .await?
        .expect_status(StatusCode::OK)
        .and_then(|r| r.json())
        .map_err(Error::Request)
}

/// Add links, then return the refreshed board
pub async fn add_links_to_board(
    gateway: &HttpGateway,
    session: &Session,
    board_id: &str,
    links: &[Link],
) -> Result<Board> {
    if links.is_empty() {
        return Err(Error::InvalidInput("no links to add".to_string()));
    }

    gateway
        .post(session, &format!("boards/{}/links", board_id), links)
        .await?
        .expect_status(StatusCode::CREATED)
        .map_err(Error::ResourceCreation)?;

    info!(board = %board_id, links = links.len(), "links added to board");
    get_board(gateway, session, board_id).await
}

/// Announce files on the board and their plans
pub async fn register_board_files(
    gateway: &HttpGateway,
    session: &Session,
    board_id: &str,
    files: Vec<FileDescriptor>,
) -> Result<Vec<PlannedFile>> {
    let response = {
        let announcements: Vec<_> = files.iter().map(FileDescriptor::announcement).collect();
        gateway
            .post(session, &format!("boards/{}/files", board_id), &announcements)
            .await?
    };

    let remote_files: Vec<RemoteFile> = response
        .expect_status(StatusCode::CREATED)
        .and_then(|r| r.json())
        .map_err(Error::ResourceCreation)?;

    pair_plans(files, remote_files)
}

/// Upload local files to a board, then return the refreshed board
pub async fn add_files_to_board<P: AsRef<Path>>(
    gateway: &HttpGateway,
    session: &Session,
    board_id: &str,
    paths: &[P],
) -> Result<Board> {
    if paths.is_empty() {
        return Err(Error::InvalidInput("no files to add".to_string()));
    }
    session.bearer()?;

    let files = describe_all(paths).await?;
    let planned = register_board_files(gateway, session, board_id, files).await?;

    let strategy = BoardParts::new(gateway, session, board_id);
    ChunkedUploader::new(gateway, &strategy)
        .upload_all(&planned)
        .await?;

    info!(board = %board_id, files = planned.len(), "files added to board");
    get_board(gateway, session, board_id).await
}

/// Part endpoints of a v2 board
pub struct BoardParts<'a> {
    gateway: &'a HttpGateway,
    session: &'a Session,
    board_id: &'a str,
}

impl<'a> BoardParts<'a> {
    pub fn new(gateway: &'a HttpGateway, session: &'a Session, board_id: &'a str) -> Self {
        Self {
            gateway,
            session,
            board_id,
        }
    }
}

#[async_trait]
impl PartUploadStrategy for BoardParts<'_> {
    async fn part_url(&self, file: &PlannedFile, part_number: u64) -> Result<String> {
        let multipart_id = file.plan.multipart_upload_id.as_deref().ok_or_else(|| {
            Error::Protocol(format!(
                "board upload plan for file {} has no multipart id",
                file.plan.remote_file_id
            ))
        })?;

        let path = format!(
            "boards/{}/files/{}/upload-url/{}/{}",
            self.board_id, file.plan.remote_file_id, part_number, multipart_id
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

    async fn complete_file(&self, file: &PlannedFile, _part_count: u64) -> Result<()> {
        let path = format!(
            "boards/{}/files/{}/upload-complete",
            self.board_id, file.plan.remote_file_id
        );
        self.gateway
            .put_empty(self.session, &path)
            .await?
            .expect_status(StatusCode::ACCEPTED)
            .map_err(Error::Finalization)?;

        Ok(())
    }
}
