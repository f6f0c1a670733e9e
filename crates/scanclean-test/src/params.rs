//! Regression test parameters and operations

use crate::error::TestError;
use scanclean_core::{BinaryMask, RasterBuffer};

/// Regression test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Mismatches fail the test (default)
    #[default]
    Compare,
    /// Mismatches are reported but do not fail
    Display,
}

impl RegTestMode {
    /// Parse mode from the `REGTEST_MODE` environment variable
    pub fn from_env() -> Self {
        match std::env::var("REGTEST_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "display" => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// Regression test parameters
///
/// Tracks the test name, the index of the current check, and the
/// failures seen so far.
pub struct RegParams {
    /// Name of the test (e.g., "deskew")
    pub test_name: String,
    /// Current check index (incremented before each check)
    index: usize,
    pub mode: RegTestMode,
    success: bool,
    failures: Vec<String>,
}

impl RegParams {
    /// Create new regression test parameters, reading `REGTEST_MODE`.
    pub fn new(test_name: &str) -> Self {
        let mode = RegTestMode::from_env();

        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");
        eprintln!("Mode: {:?}", mode);

        Self {
            test_name: test_name.to_string(),
            index: 0,
            mode,
            success: true,
            failures: Vec::new(),
        }
    }

    /// Get the current check index
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    fn fail(&mut self, err: TestError) {
        let msg = format!("Failure in {}_reg: {}", self.test_name, err);
        eprintln!("{}", msg);
        self.failures.push(msg);
        if self.mode == RegTestMode::Compare {
            self.success = false;
        }
    }

    /// Compare two floating-point values.
    ///
    /// Returns `true` if they match within `delta`.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        let diff = (expected - actual).abs();
        // NaN never matches
        if diff <= delta {
            return true;
        }
        self.fail(TestError::ValueMismatch {
            index: self.index,
            expected,
            actual,
            delta,
        });
        false
    }

    /// Record a boolean check.
    pub fn check(&mut self, condition: bool, what: &str) -> bool {
        self.index += 1;
        if !condition {
            let msg = format!(
                "Failure in {}_reg: check {} failed: {}",
                self.test_name, self.index, what
            );
            eprintln!("{}", msg);
            self.failures.push(msg);
            if self.mode == RegTestMode::Compare {
                self.success = false;
            }
        }
        condition
    }

    /// Compare two buffers for exact equality (size, layout and bytes).
    pub fn compare_buffers(&mut self, a: &RasterBuffer, b: &RasterBuffer) -> bool {
        self.index += 1;
        if a == b {
            return true;
        }
        if a.width() == b.width() && a.height() == b.height() && a.layout() == b.layout() {
            let c = a.channels().max(1);
            if let Some(i) = a.data().iter().zip(b.data()).position(|(p, q)| p != q) {
                let px = i / c;
                eprintln!(
                    "{}_reg: first differing pixel at ({}, {})",
                    self.test_name,
                    px % a.width() as usize,
                    px / a.width() as usize
                );
            }
        } else {
            eprintln!(
                "{}_reg: {}x{} {:?} vs {}x{} {:?}",
                self.test_name,
                a.width(),
                a.height(),
                a.layout(),
                b.width(),
                b.height(),
                b.layout()
            );
        }
        self.fail(TestError::BufferMismatch { index: self.index });
        false
    }

    /// Compare two masks for exact equality.
    pub fn compare_masks(&mut self, a: &BinaryMask, b: &BinaryMask) -> bool {
        self.index += 1;
        if a == b {
            return true;
        }
        self.fail(TestError::BufferMismatch { index: self.index });
        false
    }

    /// Report results; `true` if every check passed.
    pub fn cleanup(self) -> bool {
        if self.success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();

        self.success
    }

    /// Check if all tests have passed so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get list of failures
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanclean_core::PixelLayout;

    #[test]
    fn test_compare_values_within_delta() {
        let mut rp = RegParams::new("test");
        assert!(rp.compare_values(100.0, 100.5, 1.0));
        assert_eq!(rp.index(), 1);
    }

    #[test]
    fn test_compare_values_failure() {
        let mut rp = RegParams::new("test");
        assert!(!rp.compare_values(100.0, 200.0, 0.0));
        assert!(!rp.compare_values(0.0, f64::NAN, 10.0));
        assert_eq!(rp.failures().len(), 2);
    }

    #[test]
    fn test_compare_buffers() {
        let mut rp = RegParams::new("test");
        let a = RasterBuffer::new_filled(3, 2, PixelLayout::Gray, 7).unwrap();
        let mut b = a.clone();
        assert!(rp.compare_buffers(&a, &b));
        b.set_unchecked(2, 1, 8);
        assert!(!rp.compare_buffers(&a, &b));
    }
}
