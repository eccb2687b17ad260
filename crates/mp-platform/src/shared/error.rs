//! Platform Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Signing error: {message}")]
    Signing { message: String },

    #[error("Signing server returned HTTP {status}")]
    SigningServer { status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Key error: {message}")]
    Key { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] mp_config::ConfigError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied { message: message.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing { message: message.into() }
    }

    pub fn key(message: impl Into<String>) -> Self {
        Self::Key { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = PlatformError::not_found("Addon", 3615);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Entity not found: Addon with id 3615");
    }

    #[test]
    fn test_permission_denied_message() {
        let err = PlatformError::permission_denied("User 7 is not a reviewer or developer");
        assert!(err.is_permission_denied());
        assert!(err.to_string().starts_with("Permission denied:"));
    }
}
