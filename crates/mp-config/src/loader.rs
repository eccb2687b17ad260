//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "marketplace.toml",
    "./config/config.toml",
    "./config/marketplace.toml",
    "/etc/marketplace/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, |key| env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Ok(path) = env::var("MARKETPLACE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `MARKETPLACE_*` overrides read through `lookup`.
pub(crate) fn apply_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // Site
    if let Some(val) = lookup("MARKETPLACE_SITE_URL") {
        config.site.url = val.trim_end_matches('/').to_string();
    }
    if let Some(val) = lookup("MARKETPLACE_SITE_LOCALE") {
        config.site.locale = val;
    }
    if let Some(val) = lookup("MARKETPLACE_SITE_APP") {
        config.site.app = val;
    }

    // Receipts
    if let Some(val) = lookup("MARKETPLACE_RECEIPT_EXPIRY_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.receipts.expiry_seconds = secs;
        }
    }
    if let Some(val) = lookup("MARKETPLACE_RECEIPT_URL") {
        config.receipts.receipt_url = val;
    }
    if let Some(val) = lookup("MARKETPLACE_RECEIPT_KEY_PATH") {
        config.receipts.key_path = val;
    }
    if let Some(val) = lookup("MARKETPLACE_RECEIPT_CACHE_TTL_SECS") {
        if let Ok(ttl) = val.parse() {
            config.receipts.cache_ttl_secs = ttl;
        }
    }

    // Signing server
    if let Some(val) = lookup("MARKETPLACE_SIGNING_ACTIVE") {
        config.signing.active = val.parse().unwrap_or(false);
    }
    if let Some(val) = lookup("MARKETPLACE_SIGNING_SERVER_URL") {
        config.signing.server_url = val;
    }
    if let Some(val) = lookup("MARKETPLACE_SIGNING_TIMEOUT_SECS") {
        if let Ok(timeout) = val.parse() {
            config.signing.timeout_secs = timeout;
        }
    }

    // Activity
    if let Some(val) = lookup("MARKETPLACE_TASK_USER_ID") {
        config.activity.task_user_id = val.parse().ok();
    }
}
