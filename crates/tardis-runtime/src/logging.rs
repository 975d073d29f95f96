#![forbid(unsafe_code)]

//! Process-wide log setup for hosts embedding the engine.
//!
//! The engine itself only emits through `tracing`. Hosts that do not bring
//! their own subscriber can install one of these. The filter is read from
//! `TARDIS_LOG`, then `RUST_LOG`, and defaults to `info`.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "TARDIS_LOG";

/// Filter from `TARDIS_LOG`, else `RUST_LOG`, else `default_directive`.
#[must_use]
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// One JSON object per line on stderr, with span context.
pub fn init_json() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
}

/// Human-readable output on stderr.
pub fn init_pretty() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()
}
