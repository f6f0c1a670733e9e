//! Error types for scanclean-core
//!
//! Every crate in the workspace wraps this error and reports an
//! [`ErrorKind`], so callers can tell bad input, unsupported
//! configuration, "nothing found" and cancellation apart without
//! matching on message strings.

use thiserror::Error;

/// Coarse classification shared by every error type in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Empty buffer, unsupported channel count, or a parameter out of domain.
    InvalidInput,
    /// An enumerated option has no implemented handler.
    UnsupportedConfiguration,
    /// An estimator or detector found nothing usable (strict mode only).
    NoSignal,
    /// Cooperative cancellation was observed.
    Cancelled,
}

/// scanclean-core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid buffer dimensions
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    /// Channel count other than 1, 3 or 4
    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(u32),

    /// Raw data length does not match the declared geometry
    #[error("data length mismatch: expected {expected} bytes, got {actual}")]
    DataLength { expected: usize, actual: usize },

    /// Two buffers that must share a size do not
    #[error("dimension mismatch: expected {}x{}, got {}x{}", .expected.0, .expected.1, .actual.0, .actual.1)]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Operation needs a different pixel layout
    #[error("unsupported pixel layout: expected {expected}, got {actual}")]
    UnsupportedLayout {
        expected: &'static str,
        actual: &'static str,
    },

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Empty input where content is required
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// Enumerated value without a handler
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// Cooperative cancellation observed
    #[error("operation aborted")]
    Cancelled,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedConfiguration(_) => ErrorKind::UnsupportedConfiguration,
            Error::Cancelled => ErrorKind::Cancelled,
            _ => ErrorKind::InvalidInput,
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
