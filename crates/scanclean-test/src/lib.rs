//! scanclean-test - regression test harness for scanclean
//!
//! Tests build their inputs with the [`synth`] page builders instead of
//! loading images from disk, then record checks through [`RegParams`]:
//!
//! ```
//! use scanclean_test::RegParams;
//!
//! let mut rp = RegParams::new("example");
//! rp.compare_values(3.0, 3.0, 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: `compare` (default) fails on mismatches; `display`
//!   only reports them
//! - `RUST_LOG`: filter for [`init_logging`]

mod error;
mod params;
pub mod synth;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};

/// Route `tracing` output to the test writer.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
