//! Environment configuration for the bootstrap binary.

use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Multi-line human readable output.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(AppError::Config(format!(
                "STEPCHAIN_LOG_FORMAT must be json or pretty, got {other:?}"
            ))),
        }
    }
}

/// Settings read from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Log output format (`STEPCHAIN_LOG_FORMAT`).
    pub log_format: LogFormat,
    /// Panic on sequencing invariant violations (`STEPCHAIN_STRICT`).
    pub strict: bool,
    /// How long the splash step waits (`STEPCHAIN_SPLASH_MS`).
    pub splash: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            strict: cfg!(debug_assertions),
            splash: Duration::from_millis(250),
        }
    }
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults for
    /// unset variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(format) = lookup("STEPCHAIN_LOG_FORMAT") {
            config.log_format = format.parse()?;
        }
        if let Some(strict) = lookup("STEPCHAIN_STRICT") {
            config.strict = match strict.as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                other => {
                    return Err(AppError::Config(format!(
                        "STEPCHAIN_STRICT must be true or false, got {other:?}"
                    )));
                }
            };
        }
        if let Some(splash) = lookup("STEPCHAIN_SPLASH_MS") {
            let millis: u64 = splash.parse().map_err(|e| {
                AppError::Config(format!("STEPCHAIN_SPLASH_MS must be a valid u64: {e}"))
            })?;
            config.splash = Duration::from_millis(millis);
        }

        Ok(config)
    }
}
