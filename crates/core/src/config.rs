//! Configuration management for wetransfer

use crate::error::{Error, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration directory name
const CONFIG_DIR: &str = "wetransfer";

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the configuration file location
pub const CONFIG_PATH_ENV: &str = "WETRANSFER_CONFIG";

/// Public API endpoint (v2 paths are appended)
pub const DEFAULT_ENDPOINT: &str = "https://dev.wetransfer.com";

/// Private, unversioned endpoint used for email delivery (v4 paths are appended)
pub const DEFAULT_PRIVATE_ENDPOINT: &str = "https://wetransfer.com/api";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api: ApiConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced: Option<AdvancedConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// API credentials and endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub api_key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_identifier: Option<String>,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_private_endpoint")]
    pub private_endpoint: String,
}

/// Email delivery through the private API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub sender: String,
    pub recipients: Vec<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

/// Advanced configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Log request and response bodies at debug level
    #[serde(default)]
    pub log_http_bodies: bool,
    /// Report `size / chunk_size + 1` parts on the email path
    #[serde(default)]
    pub legacy_part_count: bool,
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            log_http_bodies: false,
            legacy_part_count: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default values
fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_private_endpoint() -> String {
    DEFAULT_PRIVATE_ENDPOINT.to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ConfigFile {
    /// Minimal configuration holding only an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                api_key: api_key.into(),
                user_identifier: None,
                endpoint: default_endpoint(),
                private_endpoint: default_private_endpoint(),
            },
            email: None,
            advanced: None,
            logging: None,
        }
    }
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let home = home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
    Ok(home.join(".config").join(CONFIG_DIR))
}

/// Get the configuration file path
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

/// Load configuration from file
pub fn load_config() -> Result<ConfigFile> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        return Err(Error::ConfigNotFound(config_path));
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        Error::InvalidConfig(format!("Failed to read config file: {}", e))
    })?;

    parse_config(&content)
}

/// Parse configuration from TOML text
pub fn parse_config(content: &str) -> Result<ConfigFile> {
    toml::from_str(content).map_err(|e| {
        Error::InvalidConfig(format!("Failed to parse config file: {}", e))
    })
}

/// Save configuration to file
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let config_path = get_config_path()?;

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create config directory: {}", e))
            })?;
        }
    }

    let content = toml::to_string_pretty(config)?;

    fs::write(&config_path, content).map_err(|e| {
        Error::Config(format!("Failed to write config file: {}", e))
    })?;

    // The file holds the API key: owner read/write only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&config_path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&config_path, perms)?;
    }

    Ok(config_path)
}

/// Validate configuration
pub fn validate_config(config: &ConfigFile) -> Result<()> {
    if config.api.api_key.trim().is_empty() {
        return Err(Error::InvalidInput("API key cannot be empty".to_string()));
    }

    validate_endpoint("endpoint", &config.api.endpoint)?;
    validate_endpoint("private_endpoint", &config.api.private_endpoint)?;

    if let Some(email) = &config.email {
        if !email.sender.contains('@') {
            return Err(Error::InvalidInput(format!(
                "Sender '{}' is not an email address",
                email.sender
            )));
        }
        if email.recipients.is_empty() {
            return Err(Error::InvalidInput(
                "Email delivery needs at least one recipient".to_string(),
            ));
        }
        if let Some(bad) = email.recipients.iter().find(|r| !r.contains('@')) {
            return Err(Error::InvalidInput(format!(
                "Recipient '{}' is not an email address",
                bad
            )));
        }
    }

    if let Some(advanced) = &config.advanced {
        if advanced.timeout == 0 {
            return Err(Error::InvalidInput("Timeout must be at least 1 second".to_string()));
        }
    }

    Ok(())
}

fn validate_endpoint(name: &str, endpoint: &str) -> Result<()> {
    let url = reqwest::Url::parse(endpoint)
        .map_err(|e| Error::InvalidInput(format!("Invalid {} '{}': {}", name, endpoint, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(Error::InvalidInput(format!(
            "Invalid {} '{}': expected an http(s) URL",
            name, endpoint
        )));
    }

    Ok(())
}

/// Check if configuration exists
pub fn config_exists() -> bool {
    get_config_path().map(|p| p.exists()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_valid_config() -> ConfigFile {
        ConfigFile {
            api: ApiConfig {
                api_key: "test_api_key".to_string(),
                user_identifier: Some("user-1".to_string()),
                endpoint: DEFAULT_ENDPOINT.to_string(),
                private_endpoint: DEFAULT_PRIVATE_ENDPOINT.to_string(),
            },
            email: None,
            advanced: None,
            logging: None,
        }
    }

    #[test]
    fn test_validate_config_valid() {
        let config = make_valid_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_config_empty_api_key() {
        let mut config = make_valid_config();
        config.api.api_key = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_config_bad_endpoint() {
        let mut config = make_valid_config();
        config.api.endpoint = "dev.wetransfer.com".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = make_valid_config();
        config.api.private_endpoint = "ftp://wetransfer.com".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_config_email_without_recipients() {
        let mut config = make_valid_config();
        config.email = Some(EmailConfig {
            sender: "me@example.com".to_string(),
            recipients: vec![],
            language: "en".to_string(),
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_config_email_bad_recipient() {
        let mut config = make_valid_config();
        config.email = Some(EmailConfig {
            sender: "me@example.com".to_string(),
            recipients: vec!["you@example.com".to_string(), "nobody".to_string()],
            language: "en".to_string(),
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_config_zero_timeout() {
        let mut config = make_valid_config();
        config.advanced = Some(AdvancedConfig {
            timeout: 0,
            ..AdvancedConfig::default()
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_parse_config_applies_defaults() {
        let config = parse_config(
            r#"
            [api]
            api_key = "abc"

            [email]
            sender = "me@example.com"
            recipients = ["you@example.com"]

            [advanced]
            legacy_part_count = true
            "#,
        )
        .unwrap();

        assert_eq!(config.api.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.api.private_endpoint, DEFAULT_PRIVATE_ENDPOINT);
        assert!(config.api.user_identifier.is_none());

        let email = config.email.unwrap();
        assert_eq!(email.language, "en");

        let advanced = config.advanced.unwrap();
        assert_eq!(advanced.timeout, 60);
        assert!(advanced.legacy_part_count);
        assert!(!advanced.log_http_bodies);
    }

    #[test]
    fn test_parse_config_missing_api_key() {
        let err = parse_config("[api]\nendpoint = \"https://example.com\"\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_config_survives_toml_round_trip() {
        let config = make_valid_config();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = parse_config(&text).unwrap();
        assert_eq!(parsed.api.user_identifier.as_deref(), Some("user-1"));
        assert!(parsed.email.is_none());
    }
}
