//! Error types for scanclean-region

use scanclean_core::ErrorKind;
use thiserror::Error;

/// Errors that can occur during region processing operations
#[derive(Debug, Error)]
pub enum RegionError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] scanclean_core::Error),

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

impl RegionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegionError::Core(e) => e.kind(),
            RegionError::InvalidParameters(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Result type for region operations
pub type RegionResult<T> = Result<T, RegionError>;
