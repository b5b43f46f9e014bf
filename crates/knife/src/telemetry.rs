//! Subscriber setup for the `tracing` events emitted across knife

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;
use crate::error::{KnifeError, Result};

/// Install a global fmt subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| KnifeError::Telemetry(format!("invalid level {:?}: {}", config.level, e)))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.with_target(false).try_init()
    };
    installed.map_err(|e| KnifeError::Telemetry(e.to_string()))?;

    tracing::debug!(json = config.json, "tracing initialized");
    Ok(())
}
