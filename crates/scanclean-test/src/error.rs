//! Error types for the test harness

use thiserror::Error;

/// Errors that can occur while building fixtures
#[derive(Debug, Error)]
pub enum TestError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] scanclean_core::Error),

    /// Value comparison failed
    #[error(
        "value comparison failed at index {index}: expected {expected}, got {actual}, delta {delta}"
    )]
    ValueMismatch {
        index: usize,
        expected: f64,
        actual: f64,
        delta: f64,
    },

    /// Buffer comparison failed
    #[error("buffer comparison failed at index {index}")]
    BufferMismatch { index: usize },
}

/// Result type for test operations
pub type TestResult<T> = Result<T, TestError>;
