//! Tracing/logging initialization.
//!
//! The builder, validator, and resolver emit `debug`/`trace` events; this
//! wires a JSON subscriber so model-construction diagnostics (declaration
//! counts, recorded conflicts, resolution progress) land in structured logs.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops). The filter is
/// configurable via `RUST_LOG`; resolution tracing lives under the
/// `modelforge_model` target.
pub fn init() {
    init_with_default_filter("info");
}

/// Initialize with an explicit fallback filter, e.g. `"modelforge_model=trace"`.
pub fn init_with_default_filter(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // JSON logs + timestamps, configurable via RUST_LOG.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(true)
        .try_init();
}
