use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// Builds the filter from `RUST_LOG` when set, otherwise from the configured
/// level.
fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(config)))
}

fn filter_directive(config: &LoggingConfig) -> String {
    match config.level.trim().to_ascii_lowercase().as_str() {
        "" => "info".to_string(),
        level => level.to_string(),
    }
}

pub fn init_tracing(config: &LoggingConfig) {
    let filter = env_filter(config);

    let result = if config.format.eq_ignore_ascii_case("json") {
        fmt().with_env_filter(filter).json().try_init()
    } else {
        fmt().with_env_filter(filter).try_init()
    };

    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}
