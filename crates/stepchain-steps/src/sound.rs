//! Sound step: plays a sound through an injected player.
//!
//! Audio playback itself lives outside the engine. A step only needs
//! something that can play a [`SoundType`], handed to it at construction.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stepchain_core::{Step, StepContext};

/// Sounds the application knows how to play. Discriminants group the sounds
/// by bank: music from 1, UI from 100, world from 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundType {
    /// No sound.
    None = 0,
    /// The main music theme.
    MainMusicTheme = 1,
    /// Generic button click.
    ButtonClick = 100,
    /// Radio button click.
    RadioButtonClick = 101,
    /// A window opens.
    WindowOpen = 102,
    /// A window closes.
    WindowClose = 103,
    /// Fallback sound for world objects.
    DefaultWorldSound = 200,
}

/// Capability to play sounds, implemented by the audio subsystem.
pub trait SoundPlayer: Send + Sync {
    /// Starts playing `sound`. Playback is fire-and-forget.
    fn play_sound(&self, sound: SoundType);
}

/// Plays one sound on enter, then finishes without waiting for playback.
pub struct SoundStep {
    player: Arc<dyn SoundPlayer>,
    sound: SoundType,
}

impl SoundStep {
    /// Creates a step that plays `sound` through `player`.
    #[must_use]
    pub fn new(player: Arc<dyn SoundPlayer>, sound: SoundType) -> Self {
        Self { player, sound }
    }
}

impl std::fmt::Debug for SoundStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundStep")
            .field("sound", &self.sound)
            .finish_non_exhaustive()
    }
}

impl Step for SoundStep {
    fn name(&self) -> String {
        format!("SoundStep({:?})", self.sound)
    }

    fn on_enter(&mut self, ctx: &mut StepContext) {
        if self.sound != SoundType::None {
            self.player.play_sound(self.sound);
        }
        ctx.finish();
    }
}
