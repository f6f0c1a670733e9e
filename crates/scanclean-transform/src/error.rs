//! Error types for scanclean-transform

use scanclean_core::ErrorKind;
use thiserror::Error;

/// Errors that can occur during geometric transforms
#[derive(Debug, Error)]
pub enum TransformError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] scanclean_core::Error),

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

impl TransformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransformError::Core(e) => e.kind(),
            TransformError::InvalidParameters(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Result type for transform operations
pub type TransformResult<T> = Result<T, TransformError>;
