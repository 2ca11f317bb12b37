//! Save error types

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

static SERVER_VERSION: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?i)server version:?\s*(\d+)").ok());

/// Server version named in a rejection message, e.g.
/// `Version conflict: client version 3, server version 5`
pub fn version_in_message(message: &str) -> Option<u64> {
    let re = SERVER_VERSION.as_ref()?;
    re.captures(message)?.get(1)?.as_str().parse().ok()
}

/// Errors that can occur while saving or fetching roadmap data
#[derive(Debug, Error)]
pub enum SaveError {
    /// The server rejected the save because our version is stale
    #[error("Version conflict: {message}")]
    Conflict {
        message: String,
        server_version: Option<u64>,
    },

    #[error("Save rejected: {0}")]
    Rejected(String),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Channel error")]
    ChannelError,
}

impl SaveError {
    /// Map a `success: false` response to an error
    ///
    /// Servers that answer a conflict with `version: 0` usually name their
    /// version in the message instead.
    pub fn from_rejection(message: Option<String>, server_version: u64) -> Self {
        let message = message.unwrap_or_else(|| "Save failed".to_string());
        let lower = message.to_lowercase();
        if lower.contains("version conflict") || lower.contains("version mismatch") {
            let server_version = (server_version > 0)
                .then_some(server_version)
                .or_else(|| version_in_message(&message));
            SaveError::Conflict { message, server_version }
        } else {
            SaveError::Rejected(message)
        }
    }

    /// Check if this is an optimistic-concurrency failure
    pub fn is_conflict(&self) -> bool {
        matches!(self, SaveError::Conflict { .. })
    }

    /// Check if the same request may succeed when simply sent again
    pub fn is_retryable(&self) -> bool {
        match self {
            SaveError::ApiError { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            SaveError::Network(_) => true,
            SaveError::Timeout(_) => true,
            SaveError::Conflict { .. } => false,
            SaveError::Rejected(_) => false,
            SaveError::Json(_) => false,
            SaveError::ChannelError => false,
        }
    }

    /// Newer version reported by the server along with a conflict
    pub fn server_version(&self) -> Option<u64> {
        match self {
            SaveError::Conflict { server_version, .. } => *server_version,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_mapping() {
        let err = SaveError::from_rejection(Some("Version conflict: expected 4, got 3".to_string()), 4);
        assert!(err.is_conflict());
        assert_eq!(err.server_version(), Some(4));

        let err = SaveError::from_rejection(Some("Validation failed".to_string()), 0);
        assert!(!err.is_conflict());
        assert!(matches!(err, SaveError::Rejected(_)));

        let err = SaveError::from_rejection(None, 0);
        assert_eq!(err.to_string(), "Save rejected: Save failed");
    }

    #[test]
    fn test_conflict_version_from_message() {
        let err = SaveError::from_rejection(
            Some("Version conflict: client version 1, server version 5".to_string()),
            0,
        );
        assert!(err.is_conflict());
        assert_eq!(err.server_version(), Some(5));

        // the response field wins over the message
        let err = SaveError::from_rejection(Some("Version conflict: server version 5".to_string()), 6);
        assert_eq!(err.server_version(), Some(6));

        assert_eq!(version_in_message("client version 3"), None);
        assert_eq!(version_in_message("Server Version: 12"), Some(12));
    }

    #[test]
    fn test_conflict_without_version() {
        let err = SaveError::from_rejection(Some("version mismatch".to_string()), 0);
        assert!(err.is_conflict());
        assert_eq!(err.server_version(), None);
    }

    #[test]
    fn test_is_retryable() {
        // 5xx errors should be retryable
        assert!(
            SaveError::ApiError {
                status: 503,
                message: "Unavailable".to_string()
            }
            .is_retryable()
        );

        // 4xx errors should not be retryable
        assert!(
            !SaveError::ApiError {
                status: 400,
                message: "Bad request".to_string()
            }
            .is_retryable()
        );

        assert!(SaveError::Timeout(Duration::from_secs(30)).is_retryable());

        // Conflicts need a fresh version, not a resend
        assert!(
            !SaveError::Conflict {
                message: "stale".to_string(),
                server_version: Some(2)
            }
            .is_retryable()
        );
        assert!(!SaveError::ChannelError.is_retryable());
    }
}
