//! Logging initialization.
//!
//! Sets up tracing-subscriber with an env filter and a fmt layer on stderr.
//! `RUST_LOG` wins over the configured level.

pub mod race;

pub use race::{race_span, record_notice};

use crate::error::{Error, Result};

/// Configuration for telemetry initialization.
pub struct TelemetryConfig {
    /// Filter used when `RUST_LOG` is unset (e.g. "info", "pcs_pushover=debug").
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a subscriber was already set.
pub fn init_telemetry(config: TelemetryConfig) -> Result<()> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| Error::Other(format!("failed to init tracing subscriber: {e}")))
}
