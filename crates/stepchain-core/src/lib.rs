//! Stepchain Core: cooperative step sequencing.
//!
//! A [`Chain`] runs an ordered queue of [`Step`]s one at a time. Steps can be
//! paused, resumed, interrupted, and the queue can be edited while it runs
//! (push, replace, set-next). The outcome of a run is reported as
//! [`ProcessArgs`]. This crate has no I/O and installs no logging sink; it
//! only emits `tracing` events.

pub mod chain;
pub mod config;
mod diagnostics;
pub mod error;
pub mod process_args;
pub mod step;

pub use chain::Chain;
pub use config::ChainConfig;
pub use error::ProtocolViolation;
pub use process_args::ProcessArgs;
pub use step::{Step, StepContext, StepId, StepState};
