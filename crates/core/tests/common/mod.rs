//! Shared fixtures: a mock API server that also plays the storage provider

#![allow(dead_code)]

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use wetransfer_core::{ClientConfig, WeTransferClient};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const API_KEY: &str = "test-api-key";
pub const TOKEN: &str = "jwt-token";
pub const MIB: usize = 1024 * 1024;

/// Hands out `<server>/storage/<file_id>/<part>` for part URL requests.
///
/// The part number comes from the `upload-url/<n>` path segment, or from the
/// `chunk_number` field of a JSON body.
pub struct PartUrlResponder {
    pub storage_base: String,
}

impl Respond for PartUrlResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let segments: Vec<&str> = request.url.path().split('/').collect();

        let file_id = segments
            .iter()
            .position(|s| *s == "files")
            .and_then(|i| segments.get(i + 1))
            .copied()
            .unwrap_or("unknown");

        let part = match segments.iter().position(|s| *s == "upload-url") {
            Some(i) => segments[i + 1].parse::<u64>().unwrap(),
            None => request.body_json::<Value>().unwrap()["chunk_number"]
                .as_u64()
                .unwrap(),
        };

        ResponseTemplate::new(200).set_body_json(json!({
            "url": format!("{}/storage/{}/{}", self.storage_base, file_id, part)
        }))
    }
}

pub async fn mount_authorize(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v2/authorize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": TOKEN
        })))
        .mount(server)
        .await;
}

pub async fn mount_storage(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path_regex(r"^/storage/.+"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(API_KEY)
        .with_endpoint(server.uri())
        .with_private_endpoint(server.uri())
}

pub async fn connected_client(server: &MockServer) -> WeTransferClient {
    mount_authorize(server).await;
    WeTransferClient::connect(config_for(server)).await.unwrap()
}

/// Write `len` bytes of a repeating pattern
pub fn write_file(dir: &Path, name: &str, len: usize) -> PathBuf {
    let path = dir.join(name);
    let content: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, content).unwrap();
    path
}

pub async fn requests(server: &MockServer) -> Vec<Request> {
    server.received_requests().await.unwrap_or_default()
}

/// `"METHOD /path"` for each received request, in arrival order
pub async fn request_lines(server: &MockServer) -> Vec<String> {
    requests(server)
        .await
        .iter()
        .map(|r| format!("{} {}", r.method.as_str(), r.url.path()))
        .collect()
}

pub fn storage_puts(requests: &[Request]) -> Vec<&Request> {
    requests
        .iter()
        .filter(|r| r.method.as_str() == "PUT" && r.url.path().starts_with("/storage/"))
        .collect()
}
