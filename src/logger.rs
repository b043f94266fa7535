use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LogLevel;

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the configured level is used.
///
/// Examples:
/// - RUST_LOG=debug agentscope send GET https://api.devin.ai/v1/sessions
/// - RUST_LOG=agentscope::monitor=trace agentscope ...
pub fn init_logger(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    // try_init: a host application may already own the global subscriber
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();

    tracing::debug!("Logger initialized at {}", level.as_str());
}
