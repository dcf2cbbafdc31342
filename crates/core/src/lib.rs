//! wetransfer-core - Client library for the WeTransfer API
//!
//! Authorizes with an API key, creates transfers or boards, uploads local
//! files chunk by chunk to presigned storage URLs and finalizes the result
//! into a shareable link.

pub mod board;
pub mod client;
pub mod config;
pub mod email;
pub mod error;
pub mod file;
pub mod http;
pub mod plan;
pub mod session;
pub mod transfer;
pub mod uploader;

// Re-export commonly used types
pub use board::{Board, BoardItem, ItemKind, Link};
pub use client::{ClientConfig, WeTransferClient};
pub use config::{config_exists, get_config_path, load_config, parse_config, save_config, validate_config};
pub use config::{AdvancedConfig, ApiConfig, ConfigFile, EmailConfig, LoggingConfig};
pub use email::EmailDelivery;
pub use error::{Error, Result};
pub use file::FileDescriptor;
pub use plan::{PartCountRule, UploadPlan};
pub use transfer::TransferResource;
pub use uploader::{ChunkedUploader, MismatchPolicy, PartUploadStrategy, PlannedFile};
