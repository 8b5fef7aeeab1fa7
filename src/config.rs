//! System configuration parameters
//!
//! Tunables for the supervisor loop.  Values are validated before use;
//! out-of-range input is rejected, not clamped.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Poll period used when no configuration overrides it (20 Hz).
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 50;

/// Longest accepted poll period.
pub const MAX_POLL_INTERVAL_MS: u32 = 1000;

/// Log verbosity, mirrored onto [`log::LevelFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => Self::Off,
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Period between battery/HMI/supervisor poll rounds (milliseconds)
    pub poll_interval_ms: u32,
    /// Maximum log verbosity
    pub log_level: LogLevel,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            log_level: LogLevel::Info,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("poll_interval_ms must be > 0"));
        }
        if self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(ConfigError::ValidationFailed(
                "poll_interval_ms must be <= 1000",
            ));
        }
        Ok(())
    }

    /// Parse a JSON document, then validate it.  Missing fields take their
    /// defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|e| ConfigError::Malformed {
            line: e.line(),
            column: e.column(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Poll rounds per second.
    pub fn poll_rate_hz(&self) -> f32 {
        1000.0 / self.poll_interval_ms as f32
    }
}
