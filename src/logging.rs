//! # Logging
//!
//! Tracing subscriber setup for e2e test processes and the `e2e-ingress` binary.
//!
//! `RUST_LOG` takes precedence; otherwise the given default directive applies.
//! Initialisation is idempotent so every test may call it.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initialise logging for a binary writing to stderr
pub fn init(default_directive: &str) {
    INIT.call_once(|| {
        // Another subscriber may already be installed by the host process
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter(default_directive))
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// Initialise logging for tests
///
/// Output goes through the test writer so it is captured per test and only shown
/// for failures.
pub fn init_for_tests(default_directive: &str) {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter(default_directive))
            .with_test_writer()
            .try_init();
    });
}

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}
