use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The stored session is missing, expired or was rejected by the service.
    #[error("session expired - re-login required")]
    SessionExpired,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Check if this error means the session has to be replaced.
    #[inline]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Check if this error is transient and the call may simply be retried later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::UnexpectedStatus { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidUrl(err.to_string())
    }
}
