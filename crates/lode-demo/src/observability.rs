//! Logging setup for the demo binary.
//!
//! Library crates only emit `tracing` events; installing a subscriber is up
//! to the program. With JSON enabled every event is one object per line:
//!
//! ```json
//! {"timestamp":"2026-01-15T10:30:00.000Z","level":"DEBUG","fields":{"message":"built resolver","cache_key":"books","batch_len":3},"target":"lode_core::resolve"}
//! ```
//!
//! `RUST_LOG` overrides the configured level, e.g.
//! `RUST_LOG=lode_core=trace,sqlx=warn`.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingSettings;

/// Configuration for structured logging.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Whether to use JSON format (true) or text format (false)
    pub json_format: bool,
    /// The default log level if RUST_LOG is not set
    pub default_level: Level,
}

impl From<&LoggingSettings> for LoggingConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            json_format: settings.json,
            default_level: parse_log_level(&settings.level),
        }
    }
}

/// Maps a configured level name to a `Level`, defaulting to INFO.
pub fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Installs the global subscriber.
///
/// Call once at startup. Later calls are ignored (the subscriber is global).
pub fn init_logging(config: LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_level.to_string()));

    if config.json_format {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_file(false)
                .with_line_number(false),
        );
        let _ = tracing::subscriber::set_global_default(subscriber);
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true));
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}
