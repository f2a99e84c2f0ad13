//! Stepchain App: error types.

use thiserror::Error;

/// Startup and runtime errors for the bootstrap binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// A configuration environment variable is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The bootstrap chain finished with a failure.
    #[error("bootstrap failed: {0}")]
    Bootstrap(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = AppError::Config("STEPCHAIN_STRICT must be true or false".into());

        assert_eq!(
            err.to_string(),
            "configuration error: STEPCHAIN_STRICT must be true or false"
        );
    }
}
