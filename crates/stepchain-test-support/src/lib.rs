//! Shared test doubles for stepchain sequences.

mod log;
mod probe;
mod step;

pub use log::HookLog;
pub use probe::{CompletionProbe, Notification};
pub use step::ScriptedStep;
