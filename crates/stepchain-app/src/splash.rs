//! Delay step: waits on a Tokio timer, then reports completion.

use std::time::Duration;

use stepchain_core::{Step, StepContext};
use tokio::task::JoinHandle;

use crate::driver::CompletionSender;

/// Stays current for `delay`, then finishes through a [`CompletionSender`].
///
/// Pausing cancels the timer; resuming starts the full delay again.
///
/// The step spawns its timer on enter, so it must be entered from within a
/// Tokio runtime.
#[derive(Debug)]
pub struct DelayStep {
    name: String,
    delay: Duration,
    completions: CompletionSender,
    timer: Option<JoinHandle<()>>,
}

impl DelayStep {
    /// Creates a delay step reporting to `completions`.
    #[must_use]
    pub fn new(name: impl Into<String>, delay: Duration, completions: CompletionSender) -> Self {
        Self {
            name: name.into(),
            delay,
            completions,
            timer: None,
        }
    }
}

impl Step for DelayStep {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn on_enter(&mut self, ctx: &mut StepContext) {
        let id = ctx.id();
        let delay = self.delay;
        let completions = self.completions.clone();
        tracing::debug!(step = %self.name, ?delay, "timer started");
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            completions.finish(id);
        }));
    }

    fn on_exit(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
