//! Error types for the conversational and enrichment layer.

use std::time::Duration;

use plantguard_core::error::PlantGuardError;

/// Errors returned to chat callers. Everything else degrades to a fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Empty message")]
    EmptyMessage,
    #[error("Message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
}

/// Failure of a remote collaborator (language model, voice or weather).
///
/// Never reaches an HTTP client: the wrapper components log it and return a
/// fallback or nothing.
#[derive(Debug, thiserror::Error)]
pub enum DependencyError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DependencyError {
    /// Classify a reqwest failure, keeping timeouts distinct.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            DependencyError::Timeout(timeout)
        } else {
            DependencyError::Network(err)
        }
    }
}

impl From<DependencyError> for PlantGuardError {
    fn from(err: DependencyError) -> Self {
        PlantGuardError::Api(err.to_string())
    }
}
