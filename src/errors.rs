use thiserror::Error;

/// Error type shared by every backend and the dialect surface.
///
/// Adapters translate their storage engine's native errors into one of
/// these kinds; nothing engine-specific crosses the [`crate::Backend`] seam.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl GraphError {
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        GraphError::NotFound(msg.into())
    }

    pub fn invalid_key<T: Into<String>>(msg: T) -> Self {
        GraphError::InvalidKey(msg.into())
    }

    pub fn unavailable<T: Into<String>>(msg: T) -> Self {
        GraphError::BackendUnavailable(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, GraphError::BackendUnavailable(_))
    }
}

