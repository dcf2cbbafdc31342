//! Error types for wetransfer-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for wetransfer-core
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wetransfer-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidConfig(String),

    /// Authorize call rejected, or its response could not be understood
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A call that needs a bearer token was attempted without one
    #[error("Not authenticated: authorize the client before calling the API")]
    NotAuthenticated,

    /// Transfer or board creation rejected
    #[error("Resource creation failed: {0}")]
    ResourceCreation(String),

    /// Presigned URL request or chunk upload failed
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Upload-complete or finalize rejected
    #[error("Finalization failed: {0}")]
    Finalization(String),

    /// The remote service answered with something that breaks the API contract
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// Parts actually sent differ from the parts announced by the upload plan
    #[error("Part count mismatch for {file}: plan announced {expected} parts, {sent} were sent")]
    PartCountMismatch {
        file: String,
        expected: u64,
        sent: u64,
    },

    /// Transfer already sealed by a finalize call
    #[error("Transfer {0} is already finalized")]
    AlreadyFinalized(String),

    /// Unexpected status on a plain read call
    #[error("Request failed: {0}")]
    Request(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Timeout
    #[error("Operation timed out")]
    Timeout,
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() {
            Error::Network(err.to_string())
        } else if err.is_request() || err.is_builder() {
            Error::HttpClient(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}
