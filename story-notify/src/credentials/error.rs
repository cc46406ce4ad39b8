//! Authentication error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while producing a new session.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The login helper exited unsuccessfully.
    #[error("Login helper failed: {0}")]
    HelperFailed(String),

    /// The login did not complete in time.
    #[error("Login timed out after {0:?}")]
    Timeout(Duration),

    /// Login finished but the authentication cookie was not set.
    #[error("Login did not produce an authentication cookie")]
    MissingAuthCookie,

    /// No login strategy was available.
    #[error("No login strategies configured")]
    NoStrategies,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuthError {
    /// Check if a different login strategy could still succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NoStrategies)
    }
}
