//! Tracing subscriber setup.
//!
//! Human-readable output locally, JSON lines under CI so the log stream is
//! machine-collectable. Filtering follows `RUST_LOG`, defaulting to `info`.

use crate::config::RunMode;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber for a test-suite process.
///
/// Safe to call more than once; later calls are no-ops (test binaries
/// initialize per-process).
pub fn init(mode: RunMode) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = if mode.is_ci() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    // an already-installed subscriber (another init in the same process)
    // is fine
    drop(installed);
}
