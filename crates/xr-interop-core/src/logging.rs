//! Logging setup for hosts embedding the interop layer.
//!
//! The library itself only emits `tracing` events. A host that has no
//! subscriber of its own can call [`init`] once at startup.

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,xr_gpu_interop=debug";

/// Install a global fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter`.
///
/// Fails if a global subscriber is already installed or the filter does not parse.
pub fn init(default_filter: &str) -> anyhow::Result<()> {
    let env_filter = match std::env::var("RUST_LOG") {
        Ok(val) => EnvFilter::try_new(val)?,
        Err(_) => EnvFilter::try_new(default_filter)?,
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))
}
