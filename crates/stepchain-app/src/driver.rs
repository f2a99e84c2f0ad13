//! Chain driver: applies external completions on the chain's owning task.
//!
//! A `Chain` is single-writer. Steps that wait on something running
//! elsewhere (a timer task, an I/O future) get a [`CompletionSender`]; the
//! task owning the chain drains the matching receiver in
//! [`ChainDriver::run`] and applies each completion in arrival order.

use stepchain_core::{Chain, ProcessArgs, StepId};
use tokio::sync::mpsc;

/// An outcome reported for a waiting step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The step finished successfully.
    Finished(StepId),
    /// The step failed, ending the chain.
    Interrupted(StepId, Option<String>),
}

/// Cloneable handle for reporting completions from any task or thread.
#[derive(Debug, Clone)]
pub struct CompletionSender(mpsc::UnboundedSender<Completion>);

impl CompletionSender {
    /// Reports that step `id` finished.
    pub fn finish(&self, id: StepId) {
        self.send(Completion::Finished(id));
    }

    /// Reports that step `id` was interrupted.
    pub fn interrupt(&self, id: StepId, message: Option<String>) {
        self.send(Completion::Interrupted(id, message));
    }

    fn send(&self, completion: Completion) {
        if let Err(err) = self.0.send(completion) {
            tracing::warn!(completion = ?err.0, "chain driver is gone, dropping completion");
        }
    }
}

/// Creates a connected sender/receiver pair.
#[must_use]
pub fn completion_channel() -> (CompletionSender, mpsc::UnboundedReceiver<Completion>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CompletionSender(tx), rx)
}

/// Owns a chain and feeds it completions until it finishes.
#[derive(Debug)]
pub struct ChainDriver {
    chain: Chain,
    completions: mpsc::UnboundedReceiver<Completion>,
}

impl ChainDriver {
    /// Wraps `chain`. Completions arriving on `completions` are applied to it.
    #[must_use]
    pub fn new(chain: Chain, completions: mpsc::UnboundedReceiver<Completion>) -> Self {
        Self { chain, completions }
    }

    /// The driven chain.
    #[must_use]
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Starts the chain if needed and applies completions until it finishes.
    /// Returns the final outcome.
    ///
    /// A paused chain is resumed first, since nothing else can resume it once
    /// the driver owns it. If every sender is dropped while a step is still
    /// waiting, nothing can complete it any more, so the current step is
    /// interrupted.
    pub async fn run(mut self) -> ProcessArgs {
        if !self.chain.is_started() {
            self.chain.start(None);
        }
        if self.chain.is_paused() {
            tracing::info!("resuming the paused chain handed to the driver");
            self.chain.resume();
        }

        while !self.chain.is_finished() {
            match self.completions.recv().await {
                Some(Completion::Finished(id)) => self.chain.finish_step(id),
                Some(Completion::Interrupted(id, message)) => {
                    self.chain.interrupt_step(id, message.as_deref());
                }
                None => {
                    let Some(current) = self.chain.current_step() else {
                        break;
                    };
                    tracing::error!("completion channel closed while a step was waiting");
                    self.chain
                        .interrupt_step(current, Some("no pending completion can arrive"));
                }
            }
        }

        self.chain.process_args().cloned().unwrap_or_default()
    }
}
