//! Log subscriber setup
//!
//! Logs always go to stderr: in stdio mode stdout carries the protocol.

use tracing_subscriber::EnvFilter;

use crate::config::{LogConfig, LogFormat};
use crate::error::{Error, Result};

/// Build the env filter: `RUST_LOG` wins, otherwise the configured level
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(format!("{level},h2=warn,hyper=warn,tower=warn,ort=warn"))
        .map_err(|e| Error::configuration(format!("Invalid log level '{}': {}", level, e)))
}

/// Install the global tracing subscriber
pub fn init(config: &LogConfig) -> Result<()> {
    let filter = env_filter(&config.level)?;

    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_current_span(true)
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init(),
    };

    installed.map_err(|e| Error::configuration(format!("Failed to install log subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_accepts_levels() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(env_filter(level).is_ok(), "level {level} rejected");
        }
    }
}
