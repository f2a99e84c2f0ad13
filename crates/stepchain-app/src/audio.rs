//! Audio subsystem boundary.
//!
//! The real audio middleware is external. The bootstrap only needs to
//! initialize it and play sounds, so it depends on [`AudioSystem`] and
//! receives an implementation at construction.

use std::sync::atomic::{AtomicBool, Ordering};

use stepchain_steps::{SoundPlayer, SoundType};

/// The audio capabilities the bootstrap sequence uses.
pub trait AudioSystem: SoundPlayer {
    /// Sets up volume channels. Called once, before any sound is played.
    fn initialize(&self);
}

/// Audio system that reports through `tracing` instead of producing sound.
/// Used by the headless binary.
#[derive(Debug, Default)]
pub struct TracingAudio {
    initialized: AtomicBool,
}

impl TracingAudio {
    /// Returns `true` once `initialize` has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }
}

impl AudioSystem for TracingAudio {
    fn initialize(&self) {
        self.initialized.store(true, Ordering::Release);
        tracing::info!(music = 1.0, sfx = 1.0, "audio initialized");
    }
}

impl SoundPlayer for TracingAudio {
    fn play_sound(&self, sound: SoundType) {
        if !self.is_initialized() {
            tracing::warn!(?sound, "playing sound before audio was initialized");
        }
        tracing::info!(?sound, "playing sound");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_marks_audio_ready() {
        let audio = TracingAudio::default();
        assert!(!audio.is_initialized());

        audio.initialize();

        assert!(audio.is_initialized());
    }
}
