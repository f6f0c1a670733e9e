//! Error types for scanclean-doc

use scanclean_core::ErrorKind;
use thiserror::Error;

/// Errors that can occur during page cleanup
#[derive(Debug, Error)]
pub enum DocError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] scanclean_core::Error),

    /// Filter library error
    #[error("filter error: {0}")]
    Filter(#[from] scanclean_filter::FilterError),

    /// Morphology library error
    #[error("morphology error: {0}")]
    Morph(#[from] scanclean_morph::MorphError),

    /// Region library error
    #[error("region error: {0}")]
    Region(#[from] scanclean_region::RegionError),

    /// Transform library error
    #[error("transform error: {0}")]
    Transform(#[from] scanclean_transform::TransformError),

    /// Binarization error
    #[error("binarization error: {0}")]
    Color(#[from] scanclean_color::ColorError),

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Enumerated option without an implementation
    #[error("unsupported option: {0}")]
    UnsupportedMethod(String),

    /// Gutter split confidence below the requested minimum
    #[error("split confidence {confidence:.3} below minimum {minimum:.3}: {reason}")]
    LowConfidence {
        confidence: f64,
        minimum: f64,
        reason: String,
    },
}

impl DocError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocError::Core(e) => e.kind(),
            DocError::Filter(e) => e.kind(),
            DocError::Morph(e) => e.kind(),
            DocError::Region(e) => e.kind(),
            DocError::Transform(e) => e.kind(),
            DocError::Color(e) => e.kind(),
            DocError::InvalidParameters(_) => ErrorKind::InvalidInput,
            DocError::UnsupportedMethod(_) => ErrorKind::UnsupportedConfiguration,
            DocError::LowConfidence { .. } => ErrorKind::NoSignal,
        }
    }
}

/// Result type for page cleanup
pub type DocResult<T> = Result<T, DocError>;
