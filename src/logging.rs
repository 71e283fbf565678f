//! Logging setup.
//!
//! The client reports its notices (connections, created tables, affected
//! rows) as `tracing` events. Applications that do not install their own
//! subscriber can call `init_logging` once at startup.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "EZSQL_LOG";

/// Installs a fmt subscriber on stderr.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case the existing one is left in place.
pub fn init_logging(config: Option<&LoggingConfig>) -> bool {
    let filter = config.and_then(|c| c.filter.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Priority: explicit filter > EZSQL_LOG > RUST_LOG > default.
fn build_env_filter(custom_filter: Option<&str>) -> EnvFilter {
    if let Some(filter) = custom_filter {
        return EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(default_log_filter()));
    }

    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter()))
}

pub fn default_log_filter() -> &'static str {
    #[cfg(debug_assertions)]
    {
        "info,ezsql=debug"
    }
    #[cfg(not(debug_assertions))]
    {
        "info"
    }
}
