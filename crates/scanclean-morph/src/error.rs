//! Error types for scanclean-morph

use scanclean_core::ErrorKind;
use thiserror::Error;

/// Errors that can occur during morphological operations
#[derive(Debug, Error)]
pub enum MorphError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] scanclean_core::Error),

    /// Invalid structuring element
    #[error("invalid structuring element: {0}")]
    InvalidSel(String),
}

impl MorphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MorphError::Core(e) => e.kind(),
            MorphError::InvalidSel(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Result type for morphological operations
pub type MorphResult<T> = Result<T, MorphError>;
