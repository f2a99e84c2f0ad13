//! Step abstraction and the per-step lifecycle state machine.
//!
//! A [`Step`] only supplies hooks. The lifecycle flags and transition rules
//! live in the chain-owned slot wrapping each step, so every step supports
//! the full start/enter/exit/pause/resume/finish/interrupt lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diagnostics::Diagnostics;
use crate::error::ProtocolViolation;

/// Identity of a queued step, assigned when the step joins a chain.
///
/// Steps waiting on an external event hand their id to whatever will
/// complete them; the owner of the chain then reports the outcome through
/// [`Chain::finish_step`](crate::chain::Chain::finish_step) or
/// [`Chain::interrupt_step`](crate::chain::Chain::interrupt_step).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(Uuid);

impl StepId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A unit of sequenced work.
///
/// All hooks default to no-ops; implementers override the ones they need.
/// Hooks that can drive the sequence receive a [`StepContext`]; the exit-side
/// hooks only clean up.
pub trait Step {
    /// Name used in diagnostics. Defaults to the concrete type name.
    fn name(&self) -> String {
        short_type_name(std::any::type_name::<Self>()).to_owned()
    }

    /// Called once, on the first enter. Must not finish or interrupt the step.
    fn on_start(&mut self, _ctx: &mut StepContext) {}

    /// Called on every enter, after `on_start` or `on_resume`.
    fn on_enter(&mut self, _ctx: &mut StepContext) {}

    /// Called when re-entering after a pause, before `on_enter`.
    fn on_resume(&mut self, _ctx: &mut StepContext) {}

    /// Called on every exit, whether caused by pause, finish or interrupt.
    fn on_exit(&mut self) {}

    /// Called after `on_exit` when the step is paused.
    fn on_pause(&mut self) {}

    /// Called when the step completes successfully.
    fn on_finish(&mut self) {}

    /// Called when the step completes with an interruption.
    fn on_interrupt(&mut self) {}
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Boxes steps into the `Vec<Box<dyn Step>>` accepted by queue operations.
///
/// ```
/// use stepchain_core::{steps, Chain, Step};
///
/// struct Intro;
/// impl Step for Intro {}
///
/// let chain = Chain::new(steps![Intro, Intro]);
/// assert_eq!(chain.len(), 2);
/// ```
#[macro_export]
macro_rules! steps {
    ($($step:expr),* $(,)?) => {
        vec![$(::std::boxed::Box::new($step) as ::std::boxed::Box<dyn $crate::Step>),*]
    };
}

pub(crate) enum Request {
    Finish,
    Interrupt(Option<String>),
    Push(Vec<Box<dyn Step>>),
    Replace(Vec<Box<dyn Step>>),
    SetNext(Vec<Box<dyn Step>>),
}

impl Request {
    fn completes(&self) -> bool {
        matches!(self, Self::Finish | Self::Interrupt(_))
    }
}

/// Handle through which a step drives its chain from inside a hook.
///
/// Requests are applied by the chain after the hook returns, in the order
/// they were issued. Work started by a request (for example the enter of a
/// pushed step) runs to completion before the next request is applied.
pub struct StepContext {
    id: StepId,
    requests: Vec<Request>,
}

impl StepContext {
    fn new(id: StepId) -> Self {
        Self {
            id,
            requests: Vec::new(),
        }
    }

    /// The id of the step receiving this context.
    #[must_use]
    pub fn id(&self) -> StepId {
        self.id
    }

    /// Completes this step successfully; the chain moves on to the next step.
    pub fn finish(&mut self) {
        self.requests.push(Request::Finish);
    }

    /// Completes this step with an interruption, which ends the whole chain
    /// with a failure.
    pub fn interrupt(&mut self) {
        self.requests.push(Request::Interrupt(None));
    }

    /// Like [`interrupt`](Self::interrupt), recording `message` in the run's
    /// outcome.
    pub fn interrupt_with(&mut self, message: impl Into<String>) {
        self.requests.push(Request::Interrupt(Some(message.into())));
    }

    /// Pauses this step and runs `steps` ahead of it.
    pub fn push(&mut self, steps: Vec<Box<dyn Step>>) {
        self.requests.push(Request::Push(steps));
    }

    /// Single-step form of [`push`](Self::push).
    pub fn push_step(&mut self, step: impl Step + 'static) {
        self.push(vec![Box::new(step)]);
    }

    /// Finishes this step and puts `steps` in its place.
    pub fn replace(&mut self, steps: Vec<Box<dyn Step>>) {
        self.requests.push(Request::Replace(steps));
    }

    /// Single-step form of [`replace`](Self::replace).
    pub fn replace_step(&mut self, step: impl Step + 'static) {
        self.replace(vec![Box::new(step)]);
    }

    /// Schedules `steps` right after this one without disturbing it.
    pub fn set_next(&mut self, steps: Vec<Box<dyn Step>>) {
        self.requests.push(Request::SetNext(steps));
    }

    /// Single-step form of [`set_next`](Self::set_next).
    pub fn set_next_step(&mut self, step: impl Step + 'static) {
        self.set_next(vec![Box::new(step)]);
    }
}

/// Lifecycle flags of a queued step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepState {
    /// `on_start` has run.
    pub started: bool,
    /// Between `on_enter` and `on_exit`.
    pub entered: bool,
    /// Exited by a pause and waiting to be resumed.
    pub paused: bool,
    /// Finished or interrupted. Terminal.
    pub completed: bool,
}

pub(crate) struct StepSlot {
    pub(crate) id: StepId,
    pub(crate) state: StepState,
    step: Box<dyn Step>,
}

impl StepSlot {
    pub(crate) fn new(step: Box<dyn Step>) -> Self {
        Self {
            id: StepId::new(),
            state: StepState::default(),
            step,
        }
    }

    pub(crate) fn name(&self) -> String {
        self.step.name()
    }

    /// Runs the enter transition and returns the requests the hooks issued.
    pub(crate) fn enter(&mut self, diagnostics: &mut Diagnostics) -> Vec<Request> {
        if self.state.completed {
            diagnostics.report(ProtocolViolation::EnterCompleted { step: self.name() });
            return Vec::new();
        }

        let mut ctx = StepContext::new(self.id);
        if !self.state.started {
            self.state.started = true;
            tracing::debug!(chain = %diagnostics.label(), step = %self.name(), "step started");
            self.step.on_start(&mut ctx);
            if ctx.requests.iter().any(Request::completes) {
                diagnostics.report(ProtocolViolation::CompletedFromStart { step: self.name() });
                ctx.requests.retain(|request| !request.completes());
            }
        } else if self.state.paused {
            self.state.paused = false;
            tracing::debug!(chain = %diagnostics.label(), step = %self.name(), "step resumed");
            self.step.on_resume(&mut ctx);
        } else {
            diagnostics.report(ProtocolViolation::ReenterActive { step: self.name() });
            return Vec::new();
        }

        self.state.entered = true;
        self.step.on_enter(&mut ctx);

        if ctx.requests.iter().filter(|request| request.completes()).count() > 1 {
            diagnostics.report(ProtocolViolation::DoubleCompletion { step: self.name() });
            let mut completed = false;
            ctx.requests.retain(|request| {
                !request.completes() || !std::mem::replace(&mut completed, true)
            });
        }
        ctx.requests
    }

    pub(crate) fn pause(&mut self, diagnostics: &mut Diagnostics) {
        if self.state.paused {
            return;
        }
        if !self.state.entered {
            diagnostics.report(ProtocolViolation::PauseInactive { step: self.name() });
            return;
        }

        self.exit();
        self.step.on_pause();
        self.state.paused = true;
        tracing::debug!(chain = %diagnostics.label(), step = %self.name(), "step paused");
    }

    /// Runs the finish hooks. Returns `false` if the step was already completed.
    pub(crate) fn finish(&mut self) -> bool {
        if self.state.completed {
            return false;
        }
        self.exit();
        self.step.on_finish();
        self.complete();
        true
    }

    /// Runs the interrupt hooks. Returns `false` if the step was already completed.
    pub(crate) fn interrupt(&mut self) -> bool {
        if self.state.completed {
            return false;
        }
        self.exit();
        self.step.on_interrupt();
        self.complete();
        true
    }

    fn complete(&mut self) {
        self.state.completed = true;
        self.state.paused = false;
    }

    fn exit(&mut self) {
        if !self.state.entered {
            return;
        }
        self.state.entered = false;
        self.step.on_exit();
    }
}
