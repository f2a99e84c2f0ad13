//! Stepchain bootstrap entry point.

use std::error::Error;
use std::sync::Arc;

use stepchain_app::audio::TracingAudio;
use stepchain_app::bootstrap::App;
use stepchain_app::config::{AppConfig, LogFormat};
use stepchain_app::error::AppError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Read configuration from environment.
    let config = AppConfig::from_env()?;

    // Initialize tracing subscriber.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).pretty().init(),
    }

    tracing::info!(?config, "Starting stepchain bootstrap");

    let mut app = App::new(config, Arc::new(TracingAudio::default()));
    let Some(driver) = app.initialize() else {
        return Ok(());
    };
    let outcome = driver.run().await;

    tracing::info!(outcome = %serde_json::to_string(&outcome)?, "Bootstrap finished");
    if !outcome.is_success() {
        return Err(AppError::Bootstrap(outcome.message()).into());
    }

    Ok(())
}
