//! Stepchain Steps: reusable instant steps.
//!
//! Instant steps do their work on enter and finish right away, so they never
//! stay current long enough to be paused.

pub mod action;
pub mod sound;

pub use action::ActionStep;
pub use sound::{SoundPlayer, SoundStep, SoundType};
