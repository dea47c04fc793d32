use alloc::string::String;

/// Coarse classification of a failed page load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadErrorKind {
    /// The request failed or the catalog answered with a non-2xx status.
    Network,
    /// The response body was not a JSON array of records.
    Parse,
}

/// A failed page load, as stored in [`crate::ListState::error`].
///
/// This type is transport-agnostic: adapters convert their own error types into it before
/// handing a result to [`crate::Pager::complete`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("{kind:?} error: {message}")]
pub struct LoadError {
    pub kind: LoadErrorKind,
    pub message: String,
}

impl LoadError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: LoadErrorKind::Network,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: LoadErrorKind::Parse,
            message: message.into(),
        }
    }
}
