use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum BrowserError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("cache I/O error: {0}")]
    CacheIo(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid URL template: {0}")]
    InvalidTemplate(String),

    #[error("entity has no descriptor: {0}")]
    MissingDescriptor(String),

    #[error("Poisoned lock error: {0}")]
    PoisonedLock(String),
}

impl From<std::io::Error> for BrowserError {
    fn from(err: std::io::Error) -> Self {
        BrowserError::CacheIo(err.to_string())
    }
}

impl From<serde_json::Error> for BrowserError {
    fn from(err: serde_json::Error) -> Self {
        BrowserError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for BrowserError {
    fn from(err: serde_yaml::Error) -> Self {
        BrowserError::Configuration(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for BrowserError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        BrowserError::PoisonedLock(err.to_string())
    }
}

impl From<reqwest::Error> for BrowserError {
    fn from(err: reqwest::Error) -> Self {
        BrowserError::Upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_maps_to_cache_io() {
        let err: BrowserError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into();
        assert!(matches!(err, BrowserError::CacheIo(msg) if msg.contains("read-only")));
    }

    #[test]
    fn test_json_error_maps_to_serialization() {
        let err: BrowserError = serde_json::from_str::<serde_json::Value>("{nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, BrowserError::Serialization(_)));
    }

    #[test]
    fn test_display() {
        let err = BrowserError::NotFound("namespace 'Nonexistent'".to_string());
        assert_eq!(err.to_string(), "not found: namespace 'Nonexistent'");
    }
}
