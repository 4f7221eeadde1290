//! Testing utilities for taskflow runners.
//!
//! This module provides:
//! - CallbackLog for recording callback order across threads
//! - TestError for exercising failure paths
//! - init_tracing for log output while running tests

mod probe;

pub use probe::{CallbackLog, TestError};

/// Installs a tracing subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
