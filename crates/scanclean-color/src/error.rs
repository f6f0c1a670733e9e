//! Error types for scanclean-color

use scanclean_core::ErrorKind;
use thiserror::Error;

/// Errors that can occur during binarization
#[derive(Debug, Error)]
pub enum ColorError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] scanclean_core::Error),

    /// Filter error
    #[error("filter error: {0}")]
    Filter(#[from] scanclean_filter::FilterError),

    /// Morphology error
    #[error("morphology error: {0}")]
    Morph(#[from] scanclean_morph::MorphError),

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Method or pre-method name without an implementation
    #[error("unsupported binarization method: {0}")]
    UnsupportedMethod(String),
}

impl ColorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ColorError::Core(e) => e.kind(),
            ColorError::Filter(e) => e.kind(),
            ColorError::Morph(e) => e.kind(),
            ColorError::InvalidParameters(_) => ErrorKind::InvalidInput,
            ColorError::UnsupportedMethod(_) => ErrorKind::UnsupportedConfiguration,
        }
    }
}

/// Result type for binarization
pub type ColorResult<T> = Result<T, ColorError>;
