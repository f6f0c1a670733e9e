//! Error types for scanclean-filter

use scanclean_core::ErrorKind;
use thiserror::Error;

/// Errors that can occur during filtering operations
#[derive(Debug, Error)]
pub enum FilterError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] scanclean_core::Error),

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

impl FilterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FilterError::Core(e) => e.kind(),
            FilterError::InvalidParameters(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;
