//! Application bootstrap.
//!
//! All app-level systems are initialized here, in order, by a single chain.
//! Once it completes the game is running.

use std::sync::Arc;

use stepchain_core::{Chain, ChainConfig, steps};
use stepchain_steps::{ActionStep, SoundPlayer, SoundStep, SoundType};

use crate::audio::AudioSystem;
use crate::config::AppConfig;
use crate::driver::{ChainDriver, completion_channel};
use crate::splash::DelayStep;

/// Entry point of the application.
#[derive(Debug)]
pub struct App<A> {
    config: AppConfig,
    audio: Arc<A>,
    initialized: bool,
}

impl<A> App<A>
where
    A: AudioSystem + 'static,
{
    /// Creates an app that will initialize and play through `audio`.
    #[must_use]
    pub fn new(config: AppConfig, audio: Arc<A>) -> Self {
        Self {
            config,
            audio,
            initialized: false,
        }
    }

    /// Returns `true` once [`initialize`](Self::initialize) has been called.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Starts the bootstrap sequence: initialize audio, play the main theme,
    /// hold the splash screen, initialize the game.
    ///
    /// Returns the driver that completes the sequence, or `None` if the app
    /// was already initialized.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn initialize(&mut self) -> Option<ChainDriver> {
        if self.initialized {
            tracing::debug!("app already initialized");
            return None;
        }
        self.initialized = true;

        let (completions, receiver) = completion_channel();
        let audio = Arc::clone(&self.audio);
        let player: Arc<dyn SoundPlayer> = self.audio.clone();
        let config = ChainConfig {
            strict: self.config.strict,
            name: Some("bootstrap".to_owned()),
        };

        let chain = Chain::create_and_run_with(
            config,
            steps![
                ActionStep::new("initialize audio", move || audio.initialize()),
                SoundStep::new(player, SoundType::MainMusicTheme),
                DelayStep::new("splash", self.config.splash, completions),
                ActionStep::new("initialize game", || tracing::info!("game initialized")),
            ],
        );

        Some(ChainDriver::new(chain, receiver))
    }
}
