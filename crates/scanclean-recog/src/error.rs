//! Error types for scanclean-recog

use scanclean_core::ErrorKind;
use thiserror::Error;

/// Errors that can occur during skew estimation and deskewing
#[derive(Debug, Error)]
pub enum RecogError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] scanclean_core::Error),

    /// Transform library error
    #[error("transform error: {0}")]
    Transform(#[from] scanclean_transform::TransformError),

    /// Filter library error
    #[error("filter error: {0}")]
    Filter(#[from] scanclean_filter::FilterError),

    /// Region library error
    #[error("region error: {0}")]
    Region(#[from] scanclean_region::RegionError),

    /// Morphology library error
    #[error("morphology error: {0}")]
    Morph(#[from] scanclean_morph::MorphError),

    /// Binarization error
    #[error("binarization error: {0}")]
    Color(#[from] scanclean_color::ColorError),

    /// Invalid parameter provided
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Skew method name without an estimator
    #[error("unsupported skew method: {0}")]
    UnsupportedMethod(String),

    /// No content found in image
    #[error("no content found: {0}")]
    NoContent(String),
}

impl RecogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecogError::Core(e) => e.kind(),
            RecogError::Transform(e) => e.kind(),
            RecogError::Filter(e) => e.kind(),
            RecogError::Region(e) => e.kind(),
            RecogError::Morph(e) => e.kind(),
            RecogError::Color(e) => e.kind(),
            RecogError::InvalidParameter(_) => ErrorKind::InvalidInput,
            RecogError::UnsupportedMethod(_) => ErrorKind::UnsupportedConfiguration,
            RecogError::NoContent(_) => ErrorKind::NoSignal,
        }
    }
}

/// Result type for recognition operations
pub type RecogResult<T> = Result<T, RecogError>;
