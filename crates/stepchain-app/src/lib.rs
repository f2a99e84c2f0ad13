//! Stepchain App: the application bootstrap sequence.
//!
//! Initializes the app-level systems as one chain: audio, the main theme, a
//! splash delay completed by a timer, then the game. Timer completions are
//! marshalled back onto the task that owns the chain.

pub mod audio;
pub mod bootstrap;
pub mod config;
pub mod driver;
pub mod error;
pub mod splash;
