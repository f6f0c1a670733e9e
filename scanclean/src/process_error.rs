//! Caller-facing error type
//!
//! Every crate below the facade has its own error enum. At this boundary
//! they collapse onto the four outcomes a host distinguishes, keeping the
//! original message for display.

use scanclean_core::ErrorKind;
use thiserror::Error;

/// Failure of a command, pipeline or parameter parse
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Empty buffer, wrong parameter type, or a value out of domain
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Enumerated value without a handler
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// Nothing usable was found and the caller asked for strict mode
    #[error("no signal: {0}")]
    NoSignal(String),

    /// Cooperative cancellation observed
    #[error("operation aborted")]
    Cancelled,
}

impl ProcessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessError::InvalidInput(_) => ErrorKind::InvalidInput,
            ProcessError::UnsupportedConfiguration(_) => ErrorKind::UnsupportedConfiguration,
            ProcessError::NoSignal(_) => ErrorKind::NoSignal,
            ProcessError::Cancelled => ErrorKind::Cancelled,
        }
    }

    fn from_kind(kind: ErrorKind, message: String) -> Self {
        match kind {
            ErrorKind::InvalidInput => ProcessError::InvalidInput(message),
            ErrorKind::UnsupportedConfiguration => ProcessError::UnsupportedConfiguration(message),
            ErrorKind::NoSignal => ProcessError::NoSignal(message),
            ErrorKind::Cancelled => ProcessError::Cancelled,
        }
    }
}

macro_rules! impl_from_crate_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ProcessError {
                fn from(e: $ty) -> Self {
                    ProcessError::from_kind(e.kind(), e.to_string())
                }
            }
        )*
    };
}

impl_from_crate_error!(
    scanclean_core::Error,
    scanclean_morph::MorphError,
    scanclean_filter::FilterError,
    scanclean_region::RegionError,
    scanclean_transform::TransformError,
    scanclean_color::ColorError,
    scanclean_recog::RecogError,
    scanclean_doc::DocError,
);

/// Result type for facade operations
pub type ProcessResult<T> = Result<T, ProcessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_survives_conversion() {
        let e: ProcessError = scanclean_core::Error::Cancelled.into();
        assert_eq!(e.kind(), ErrorKind::Cancelled);

        let e: ProcessError = scanclean_doc::DocError::LowConfidence {
            confidence: 0.2,
            minimum: 0.5,
            reason: "flat profile".into(),
        }
        .into();
        assert_eq!(e.kind(), ErrorKind::NoSignal);
        assert!(e.to_string().contains("flat profile"));

        let e: ProcessError = scanclean_color::ColorError::UnsupportedMethod("Otsu2".into()).into();
        assert_eq!(e.kind(), ErrorKind::UnsupportedConfiguration);
    }
}
