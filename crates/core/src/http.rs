//! HTTP gateway for the WeTransfer API and for presigned storage URLs

use crate::error::{Error, Result};
use crate::session::Session;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

/// Static API key header sent with every service call
const API_KEY_HEADER: &str = "x-api-key";

/// Status and decoded body of a service call
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    async fn read(response: Response, log_bodies: bool) -> Result<Self> {
        let status = response.status();
        let text = response.text().await?;

        if log_bodies {
            debug!(status = status.as_u16(), body = %text, "response body");
        }

        // Undecodable bodies are kept verbatim; typed decoding decides whether that is fatal.
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(Self { status, body })
    }

    /// Server-provided message, falling back to the raw body or the status reason
    pub fn message(&self) -> String {
        match &self.body {
            Value::Object(map) => match map.get("message").and_then(Value::as_str) {
                Some(message) => message.to_string(),
                None => self.body.to_string(),
            },
            Value::String(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => self
                .status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string(),
        }
    }

    /// Fail with `"<status>: <message>"` unless the status is exactly `expected`
    pub fn expect_status(self, expected: StatusCode) -> std::result::Result<Self, String> {
        if self.status == expected {
            Ok(self)
        } else {
            Err(self.failure())
        }
    }

    /// Fail with `"<status>: <message>"` unless the status is 2xx
    pub fn expect_success(self) -> std::result::Result<Self, String> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(self.failure())
        }
    }

    /// Decode the body into `T`
    pub fn json<T: DeserializeOwned>(self) -> std::result::Result<T, String> {
        serde_json::from_value(self.body)
            .map_err(|e| format!("{}: malformed response body: {}", self.status.as_u16(), e))
    }

    fn failure(&self) -> String {
        let message = self.message();
        error!(status = self.status.as_u16(), %message, "unexpected API status");
        format!("{}: {}", self.status.as_u16(), message)
    }
}

/// Issues requests against one versioned API root (e.g. `https://dev.wetransfer.com/v2`)
pub struct HttpGateway {
    http_client: Client,
    base_url: String,
    log_bodies: bool,
}

impl HttpGateway {
    /// Create a gateway rooted at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration, log_bodies: bool) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            http_client,
            base_url,
            log_bodies,
        })
    }

    /// Full URL for an API path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Authenticated GET
    pub async fn get(&self, session: &Session, path: &str) -> Result<ApiResponse> {
        let token = session.bearer()?;
        self.send(Method::GET, path, session.api_key(), Some(token), None)
            .await
    }

    /// Authenticated POST with a JSON body
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        session: &Session,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse> {
        let token = session.bearer()?;
        let body = serde_json::to_value(body)?;
        self.send(Method::POST, path, session.api_key(), Some(token), Some(body))
            .await
    }

    /// Authenticated PUT with a JSON body
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        session: &Session,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse> {
        let token = session.bearer()?;
        let body = serde_json::to_value(body)?;
        self.send(Method::PUT, path, session.api_key(), Some(token), Some(body))
            .await
    }

    /// Authenticated PUT without a body
    pub async fn put_empty(&self, session: &Session, path: &str) -> Result<ApiResponse> {
        let token = session.bearer()?;
        self.send(Method::PUT, path, session.api_key(), Some(token), None)
            .await
    }

    /// POST carrying only the API key; used by the authorize call
    pub async fn post_with_api_key(
        &self,
        session: &Session,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse> {
        self.send(Method::POST, path, session.api_key(), None, body)
            .await
    }

    /// Upload one chunk to a presigned storage URL.
    ///
    /// The storage provider authorizes through the URL signature, so no
    /// service header is attached.
    pub async fn put_presigned(&self, url: &str, chunk: Vec<u8>) -> Result<()> {
        debug!(bytes = chunk.len(), "PUT presigned chunk");

        let response = self
            .http_client
            .put(url)
            .body(chunk)
            .send()
            .await
            .map_err(|e| Error::Upload(format!("storage request failed: {}", e)))?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "storage rejected chunk");
            return Err(Error::Upload(format!(
                "{}: storage rejected chunk: {}",
                status.as_u16(),
                text.trim()
            )));
        }

        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        api_key: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> Result<ApiResponse> {
        let url = self.endpoint(path);
        debug!(%method, %url, "API request");

        let mut request = self
            .http_client
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, api_key);

        if let Some(token) = bearer {
            request = request.header(AUTHORIZATION, token);
        }

        if let Some(body) = body {
            if self.log_bodies {
                debug!(body = %body, "request body");
            }
            request = request.body(serde_json::to_vec(&body)?);
        }

        let response = request.send().await?;
        ApiResponse::read(response, self.log_bodies).await
    }
}
