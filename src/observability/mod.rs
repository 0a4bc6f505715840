//! Observability
//!
//! Structured JSON event lines for model declaration, record construction
//! and the CLI. Logging never alters construction results.
//!
//! # Usage
//!
//! ```ignore
//! use simple_model::observability::{log_event_with_fields, Event, LogConfig};
//!
//! LogConfig::from_env().apply();
//! log_event_with_fields(Event::ModelsLoaded, &[("models", "3")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{LogStream, Logger, Severity};

use std::env;

use serde::{Deserialize, Serialize};

/// Environment variable read by [`LogConfig::from_env`]
pub const LOG_ENV_VAR: &str = "SIMPLE_MODEL_LOG";

/// Logging configuration
///
/// Silent below WARN by default: construction events are DEBUG/TRACE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: Severity,
    pub stream: LogStream,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Severity::Warn,
            stream: LogStream::Stderr,
        }
    }
}

impl LogConfig {
    /// Reads the minimum level from `SIMPLE_MODEL_LOG` over the defaults
    pub fn from_env() -> Self {
        Self::default().with_env_override()
    }

    /// Replaces the level with `SIMPLE_MODEL_LOG` when it is set and parses.
    pub fn with_env_override(mut self) -> Self {
        if let Some(level) = env::var(LOG_ENV_VAR)
            .ok()
            .and_then(|raw| raw.parse::<Severity>().ok())
        {
            self.level = level;
        }
        self
    }

    /// Installs this configuration process-wide
    pub fn apply(&self) {
        Logger::set_min_severity(self.level);
        Logger::set_stream(self.stream);
    }
}

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
