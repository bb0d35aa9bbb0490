//! Test support for treeprng
//!
//! Proptest strategies for keys and key paths, and a tracing initializer
//! for tests that want to see node lifecycle logs.

/// Property test strategies
pub mod strategies;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per process
///
/// Honors `RUST_LOG`; defaults to `treeprng=debug`.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("treeprng=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
