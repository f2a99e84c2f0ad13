//! End-to-end runs of the bootstrap sequence.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use stepchain_app::audio::AudioSystem;
use stepchain_app::bootstrap::App;
use stepchain_app::config::AppConfig;
use stepchain_steps::{SoundPlayer, SoundType};

/// Records audio calls in order.
#[derive(Debug, Default)]
struct RecordingAudio {
    calls: Mutex<Vec<String>>,
}

impl RecordingAudio {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl AudioSystem for RecordingAudio {
    fn initialize(&self) {
        self.calls.lock().unwrap().push("initialize".to_owned());
    }
}

impl SoundPlayer for RecordingAudio {
    fn play_sound(&self, sound: SoundType) {
        self.calls.lock().unwrap().push(format!("play {sound:?}"));
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        splash: Duration::from_millis(5),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn test_bootstrap_initializes_audio_before_playing_the_theme() {
    // Arrange
    let audio = Arc::new(RecordingAudio::default());
    let mut app = App::new(test_config(), Arc::clone(&audio));

    // Act
    let driver = app.initialize().unwrap();
    let waiting_on = driver.chain().step_names();
    let outcome = driver.run().await;

    // Assert
    assert_eq!(waiting_on, vec!["splash", "initialize game"]);
    assert!(outcome.is_success());
    assert_eq!(outcome.message(), "");
    assert_eq!(audio.calls(), vec!["initialize", "play MainMusicTheme"]);
}

#[tokio::test]
async fn test_initialize_runs_only_once() {
    let audio = Arc::new(RecordingAudio::default());
    let mut app = App::new(test_config(), Arc::clone(&audio));

    let driver = app.initialize().unwrap();
    let second = app.initialize();
    driver.run().await;

    assert!(app.is_initialized());
    assert!(second.is_none());
    assert_eq!(audio.calls().len(), 2);
}
