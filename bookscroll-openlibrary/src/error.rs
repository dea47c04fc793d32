use bookscroll::{LoadError, LoadErrorKind};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

/// A failed catalog request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid catalog url {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("catalog answered {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("malformed catalog response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FetchError {
    /// Maps this error onto the pager's transport-agnostic classification.
    #[must_use]
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            Self::InvalidUrl { .. } | Self::Network { .. } | Self::Status { .. } => {
                LoadErrorKind::Network
            }
            Self::Parse(_) => LoadErrorKind::Parse,
        }
    }
}

impl From<FetchError> for LoadError {
    fn from(err: FetchError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
