//! Log subscriber setup for the command-line runner.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn";
/// Default filter when instruction tracing is requested.
pub const TRACE_FILTER: &str = "trace";

/// Builds the filter directive: `RUST_LOG` when set, else a default chosen by `trace`.
#[must_use]
pub fn filter_directive(env_value: Option<&str>, trace: bool) -> String {
    match env_value {
        Some(value) if !value.trim().is_empty() => value.to_string(),
        _ if trace => TRACE_FILTER.to_string(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Installs a stderr `fmt` subscriber. Does nothing if one is already installed.
pub fn init_logging(trace: bool) {
    let env_value = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(env_value.as_deref(), trace);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
