//! Marketplace Configuration System
//!
//! TOML-based configuration with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Default lifetime of a standard receipt (182 days).
pub const DEFAULT_RECEIPT_EXPIRY_SECS: i64 = 60 * 60 * 24 * 182;

/// Longest accepted receipt lifetime (ten years).
pub const MAX_RECEIPT_EXPIRY_SECS: i64 = 60 * 60 * 24 * 365 * 10;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub receipts: ReceiptConfig,
    pub signing: SigningConfig,
    pub activity: ActivityConfig,
}

/// Public site settings used to build absolute and localized URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Absolute site URL without trailing slash, also the receipt issuer
    pub url: String,
    /// Locale prefix for rendered links
    pub locale: String,
    /// Application prefix for rendered links
    pub app: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            locale: "en-US".to_string(),
            app: "firefox".to_string(),
        }
    }
}

/// Purchase receipt settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptConfig {
    /// Lifetime of standard and developer receipts
    pub expiry_seconds: i64,
    /// Verification URL prefix for standard receipts, the add-on id is appended
    pub receipt_url: String,
    /// Path to the RSA private key (PEM) used when the signing server is inactive
    pub key_path: String,
    /// How long a signed receipt is reused for identical requests
    pub cache_ttl_secs: u64,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            expiry_seconds: DEFAULT_RECEIPT_EXPIRY_SECS,
            receipt_url: "http://localhost:8000/verify/".to_string(),
            key_path: String::new(),
            cache_ttl_secs: 600,
        }
    }
}

/// External signing server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Delegate signing to the server instead of the local key
    pub active: bool,
    pub server_url: String,
    pub timeout_secs: u64,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            active: false,
            server_url: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Activity log settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// System account whose automated actions are left out of reviewer stats
    pub task_user_id: Option<u64>,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Check values that would only fail later at request time
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.url.is_empty() {
            return Err(ConfigError::ValidationError("site.url must be set".to_string()));
        }
        if self.site.url.ends_with('/') {
            return Err(ConfigError::ValidationError(
                "site.url must not end with '/'".to_string(),
            ));
        }
        if self.receipts.expiry_seconds <= 0 {
            return Err(ConfigError::ValidationError(
                "receipts.expiry_seconds must be positive".to_string(),
            ));
        }
        if self.receipts.expiry_seconds > MAX_RECEIPT_EXPIRY_SECS {
            return Err(ConfigError::ValidationError(format!(
                "receipts.expiry_seconds must not exceed {}",
                MAX_RECEIPT_EXPIRY_SECS
            )));
        }
        if self.signing.active && self.signing.server_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "signing.server_url is required when signing.active is set".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Marketplace Configuration
# Environment variables override these settings

[site]
url = "http://localhost:8000"
locale = "en-US"
app = "firefox"

[receipts]
expiry_seconds = 15724800   # 182 days
receipt_url = "http://localhost:8000/verify/"
key_path = ""               # RSA private key (PEM) for local RS512 signing
cache_ttl_secs = 600

[signing]
active = false
server_url = ""
timeout_secs = 10

[activity]
# task_user_id = 4043307
"#
        .to_string()
    }
}
