//! The chain orchestrator.
//!
//! A [`Chain`] owns an ordered queue of steps. The head of the queue is the
//! current step while the chain runs. Steps drive the chain from inside their
//! hooks through a [`StepContext`](crate::step::StepContext); external code
//! drives it through the methods below. When the queue runs dry, or a step
//! interrupts, the chain finishes and notifies its subscribers exactly once.

use std::collections::VecDeque;
use std::fmt;

use crate::config::ChainConfig;
use crate::diagnostics::Diagnostics;
use crate::error::ProtocolViolation;
use crate::process_args::ProcessArgs;
use crate::step::{Request, Step, StepId, StepSlot, StepState};

type CompletionHandler = Box<dyn FnOnce(&ProcessArgs)>;

struct Pending {
    issuer: StepId,
    request: Request,
}

/// An ordered, pausable, interruptible sequence of steps.
pub struct Chain {
    steps: VecDeque<StepSlot>,
    process_args: Option<ProcessArgs>,
    started: bool,
    finished: bool,
    paused: bool,
    before_completed: Vec<CompletionHandler>,
    completed: Vec<CompletionHandler>,
    agenda: VecDeque<Pending>,
    diagnostics: Diagnostics,
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("name", &self.diagnostics.label())
            .field("steps", &self.step_names())
            .field("process_args", &self.process_args)
            .field("started", &self.started)
            .field("finished", &self.finished)
            .field("paused", &self.paused)
            .finish_non_exhaustive()
    }
}

fn wrap(steps: Vec<Box<dyn Step>>) -> Vec<StepSlot> {
    steps.into_iter().map(StepSlot::new).collect()
}

fn ids(slots: &[StepSlot]) -> Vec<StepId> {
    slots.iter().map(|slot| slot.id).collect()
}

impl Chain {
    /// Creates an idle chain with the default configuration.
    #[must_use]
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self::with_config(ChainConfig::default(), steps)
    }

    /// Creates an idle chain.
    #[must_use]
    pub fn with_config(config: ChainConfig, steps: Vec<Box<dyn Step>>) -> Self {
        Self {
            steps: wrap(steps).into(),
            process_args: None,
            started: false,
            finished: false,
            paused: false,
            before_completed: Vec::new(),
            completed: Vec::new(),
            agenda: VecDeque::new(),
            diagnostics: Diagnostics::new(&config),
        }
    }

    /// Builds a chain from `steps` and starts it right away.
    ///
    /// The chain is returned so that steps waiting on external events can
    /// still be reported through [`finish_step`](Self::finish_step).
    #[must_use]
    pub fn create_and_run(steps: Vec<Box<dyn Step>>) -> Self {
        Self::create_and_run_with(ChainConfig::default(), steps)
    }

    /// [`create_and_run`](Self::create_and_run) with an explicit configuration.
    #[must_use]
    pub fn create_and_run_with(config: ChainConfig, steps: Vec<Box<dyn Step>>) -> Self {
        let mut chain = Self::with_config(config, Vec::new());
        chain.push(steps);
        chain.start(None);
        chain
    }

    /// Subscribes to the internal notification fired right before
    /// completion. Intended for cleanup that must happen before consumers see
    /// the outcome.
    pub fn on_before_completed(&mut self, handler: impl FnOnce(&ProcessArgs) + 'static) {
        self.before_completed.push(Box::new(handler));
    }

    /// Subscribes to the completion notification carrying the final outcome.
    pub fn on_completed(&mut self, handler: impl FnOnce(&ProcessArgs) + 'static) {
        self.completed.push(Box::new(handler));
    }

    /// Launches the sequence with `args`, or a fresh success if `None`.
    pub fn start(&mut self, args: Option<ProcessArgs>) {
        if self.started {
            self.diagnostics.report(ProtocolViolation::AlreadyStarted);
            return;
        }

        self.process_args = Some(args.unwrap_or_default());
        self.started = true;
        tracing::info!(
            chain = %self.diagnostics.label(),
            steps = self.steps.len(),
            "chain started"
        );

        if self.steps.is_empty() {
            self.finish();
            return;
        }
        self.enter_head();
        self.drain();
    }

    /// Pauses the chain by pausing its current step. It can be resumed later.
    pub fn pause(&mut self) {
        if self.paused || self.finished {
            return;
        }
        if !self.started {
            self.diagnostics
                .report(ProtocolViolation::NotStarted { operation: "pause" });
            return;
        }

        self.paused = true;
        if let Some(head) = self.steps.front_mut() {
            head.pause(&mut self.diagnostics);
        }
        tracing::info!(chain = %self.diagnostics.label(), "chain paused");
    }

    /// Resumes a paused chain by re-entering its current step.
    pub fn resume(&mut self) {
        if !self.paused || self.finished {
            return;
        }

        self.paused = false;
        tracing::info!(chain = %self.diagnostics.label(), "chain resumed");
        self.enter_head();
        self.drain();
    }

    /// Finishes the chain immediately, with a failure, by interrupting the
    /// current step.
    pub fn interrupt(&mut self) {
        if self.finished {
            return;
        }
        let Some(current) = self.current_step() else {
            self.diagnostics
                .report(ProtocolViolation::NotStarted {
                    operation: "interrupt",
                });
            return;
        };

        self.step_interrupted(current, None);
        self.drain();
    }

    /// Puts `steps` first in execution order. A running chain pauses its
    /// current step, which resumes once the pushed steps are done.
    pub fn push(&mut self, steps: Vec<Box<dyn Step>>) -> Vec<StepId> {
        let slots = wrap(steps);
        let ids = ids(&slots);
        self.push_slots(slots);
        self.drain();
        ids
    }

    /// Single-step form of [`push`](Self::push).
    pub fn push_step(&mut self, step: impl Step + 'static) -> StepId {
        let slot = StepSlot::new(Box::new(step));
        let id = slot.id;
        self.push_slots(vec![slot]);
        self.drain();
        id
    }

    /// Finishes the current step and puts `steps` in its place.
    pub fn replace(&mut self, steps: Vec<Box<dyn Step>>) -> Vec<StepId> {
        let slots = wrap(steps);
        let ids = ids(&slots);
        self.replace_slots(slots);
        self.drain();
        ids
    }

    /// Single-step form of [`replace`](Self::replace).
    pub fn replace_step(&mut self, step: impl Step + 'static) -> StepId {
        let slot = StepSlot::new(Box::new(step));
        let id = slot.id;
        self.replace_slots(vec![slot]);
        self.drain();
        id
    }

    /// Inserts `steps` right after the current step without pausing,
    /// finishing or entering anything.
    pub fn set_next(&mut self, steps: Vec<Box<dyn Step>>) -> Vec<StepId> {
        let slots = wrap(steps);
        let ids = ids(&slots);
        self.set_next_slots(slots);
        ids
    }

    /// Single-step form of [`set_next`](Self::set_next).
    pub fn set_next_step(&mut self, step: impl Step + 'static) -> StepId {
        let slot = StepSlot::new(Box::new(step));
        let id = slot.id;
        self.set_next_slots(vec![slot]);
        id
    }

    /// Reports that step `id` finished successfully, for steps completed by
    /// an external trigger.
    pub fn finish_step(&mut self, id: StepId) {
        self.step_finished(id);
        self.drain();
    }

    /// Reports that step `id` was interrupted, for steps failed by an
    /// external trigger. Ends the chain.
    pub fn interrupt_step(&mut self, id: StepId, message: Option<&str>) {
        self.step_interrupted(id, message.map(str::to_owned));
        self.drain();
    }

    /// Whether `start` has been called.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the run has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the chain is paused by `pause`.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// The head of the queue while the chain is running.
    #[must_use]
    pub fn current_step(&self) -> Option<StepId> {
        if !self.started || self.finished {
            return None;
        }
        self.steps.front().map(|slot| slot.id)
    }

    /// The run's outcome so far; `None` until the chain is started.
    #[must_use]
    pub fn process_args(&self) -> Option<&ProcessArgs> {
        self.process_args.as_ref()
    }

    /// Ids of the queued steps, head first.
    #[must_use]
    pub fn step_ids(&self) -> Vec<StepId> {
        self.steps.iter().map(|slot| slot.id).collect()
    }

    /// Diagnostic names of the queued steps, head first.
    #[must_use]
    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(StepSlot::name).collect()
    }

    /// Lifecycle flags of a queued step.
    #[must_use]
    pub fn state_of(&self, id: StepId) -> Option<StepState> {
        self.steps
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| slot.state)
    }

    /// Number of queued steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no steps are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Protocol violations observed so far, oldest first.
    #[must_use]
    pub fn violations(&self) -> &[ProtocolViolation] {
        self.diagnostics.violations()
    }

    fn push_slots(&mut self, slots: Vec<StepSlot>) {
        if self.finished {
            self.diagnostics
                .report(ProtocolViolation::ChainFinished { operation: "push" });
            return;
        }
        if slots.is_empty() {
            return;
        }

        if self.started {
            if let Some(head) = self.steps.front_mut() {
                head.pause(&mut self.diagnostics);
            }
        }
        for slot in slots.into_iter().rev() {
            self.steps.push_front(slot);
        }
        if self.started {
            self.enter_head();
        }
    }

    fn replace_slots(&mut self, slots: Vec<StepSlot>) {
        if self.finished {
            self.diagnostics
                .report(ProtocolViolation::ChainFinished {
                    operation: "replace",
                });
            return;
        }

        // Finish hooks run here, but the orchestrator is not told: the head is
        // dropped below instead of going through `step_finished`.
        if self.started {
            if let Some(head) = self.steps.front_mut() {
                head.finish();
                tracing::debug!(
                    chain = %self.diagnostics.label(),
                    step = %head.name(),
                    "step replaced"
                );
            }
        }
        self.steps.pop_front();
        for slot in slots.into_iter().rev() {
            self.steps.push_front(slot);
        }

        if self.started {
            if self.steps.is_empty() {
                self.finish();
            } else {
                self.enter_head();
            }
        }
    }

    fn set_next_slots(&mut self, slots: Vec<StepSlot>) {
        if self.finished {
            self.diagnostics
                .report(ProtocolViolation::ChainFinished {
                    operation: "set_next",
                });
            return;
        }

        let at = usize::from(!self.steps.is_empty());
        for (offset, slot) in slots.into_iter().enumerate() {
            self.steps.insert(at + offset, slot);
        }
    }

    /// Checks that a completion report for `id` can be applied to the head.
    fn accept_report(&mut self, id: StepId, operation: &'static str) -> bool {
        if self.finished {
            self.diagnostics
                .report(ProtocolViolation::ChainFinished { operation });
            return false;
        }
        if !self.started {
            self.diagnostics
                .report(ProtocolViolation::NotStarted { operation });
            return false;
        }
        let Some(index) = self.steps.iter().position(|slot| slot.id == id) else {
            self.diagnostics.report(ProtocolViolation::UnknownStep { id });
            return false;
        };

        if index != 0 {
            let reporter = self.steps[index].name();
            let current = self.steps.front().map(StepSlot::name).unwrap_or_default();
            self.diagnostics
                .report(ProtocolViolation::StepMismatch { reporter, current });
        }
        true
    }

    fn step_finished(&mut self, id: StepId) {
        if !self.accept_report(id, "finish_step") {
            return;
        }
        let Some(head) = self.steps.front_mut() else {
            return;
        };
        if !head.finish() {
            return;
        }
        tracing::debug!(chain = %self.diagnostics.label(), step = %head.name(), "step finished");

        self.steps.pop_front();
        if self.steps.is_empty() {
            self.finish();
        } else {
            self.enter_head();
        }
    }

    fn step_interrupted(&mut self, id: StepId, message: Option<String>) {
        if !self.accept_report(id, "interrupt_step") {
            return;
        }
        let Some(head) = self.steps.front_mut() else {
            return;
        };
        if !head.interrupt() {
            return;
        }
        let step = head.name();
        self.steps.pop_front();

        let step_args = ProcessArgs::failed(message.as_deref());
        let args = self.process_args.get_or_insert_with(ProcessArgs::success);
        args.merge(&step_args);
        let message = args.message();
        if message.is_empty() {
            tracing::debug!(chain = %self.diagnostics.label(), %step, "step interrupted");
        } else {
            tracing::error!(chain = %self.diagnostics.label(), %step, "{message}");
        }

        self.finish();
    }

    /// Ends the run. Idempotent: notifications fire only on the first call.
    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        let still_entered: Vec<String> = self
            .steps
            .iter()
            .filter(|slot| slot.state.entered)
            .map(StepSlot::name)
            .collect();
        for step in still_entered {
            self.diagnostics
                .report(ProtocolViolation::StillEntered { step });
        }
        self.steps.clear();

        let before_completed = std::mem::take(&mut self.before_completed);
        let completed = std::mem::take(&mut self.completed);
        let args: &ProcessArgs = self.process_args.get_or_insert_with(ProcessArgs::success);
        tracing::info!(
            chain = %self.diagnostics.label(),
            success = args.is_success(),
            "chain finished"
        );
        for handler in before_completed {
            handler(args);
        }
        for handler in completed {
            handler(args);
        }
    }

    fn enter_head(&mut self) {
        let Some(head) = self.steps.front_mut() else {
            return;
        };
        let issuer = head.id;
        let requests = head.enter(&mut self.diagnostics);
        for request in requests.into_iter().rev() {
            self.agenda.push_front(Pending { issuer, request });
        }
    }

    /// Applies requests issued by step hooks. Requests from a newly entered
    /// step go to the front, so each request's consequences settle before the
    /// next sibling request runs.
    fn drain(&mut self) {
        while let Some(Pending { issuer, request }) = self.agenda.pop_front() {
            match request {
                Request::Finish => self.step_finished(issuer),
                Request::Interrupt(message) => self.step_interrupted(issuer, message),
                Request::Push(steps) => self.push_slots(wrap(steps)),
                Request::Replace(steps) => self.replace_slots(wrap(steps)),
                Request::SetNext(steps) => self.set_next_slots(wrap(steps)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::step::StepContext;
    use crate::steps;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Logs its hooks and runs `script` on every enter.
    struct Scripted {
        name: &'static str,
        log: Log,
        script: fn(&mut StepContext),
    }

    impl Step for Scripted {
        fn name(&self) -> String {
            self.name.to_owned()
        }
        fn on_enter(&mut self, ctx: &mut StepContext) {
            self.log.borrow_mut().push(format!("{}:enter", self.name));
            (self.script)(ctx);
        }
        fn on_finish(&mut self) {
            self.log.borrow_mut().push(format!("{}:finish", self.name));
        }
    }

    fn scripted(name: &'static str, log: &Log, script: fn(&mut StepContext)) -> Scripted {
        Scripted {
            name,
            log: Rc::clone(log),
            script,
        }
    }

    fn waiting(_: &mut StepContext) {}

    fn finishing(ctx: &mut StepContext) {
        ctx.finish();
    }

    fn count_completions(chain: &mut Chain) -> Rc<RefCell<u32>> {
        let count = Rc::new(RefCell::new(0));
        let before = Rc::clone(&count);
        chain.on_before_completed(move |_| *before.borrow_mut() += 1);
        let after = Rc::clone(&count);
        chain.on_completed(move |_| *after.borrow_mut() += 1);
        count
    }

    #[test]
    fn test_empty_chain_finishes_on_start() {
        // Arrange
        let mut chain = Chain::new(Vec::new());
        let count = count_completions(&mut chain);

        // Act
        chain.start(None);

        // Assert
        assert!(chain.is_finished());
        assert_eq!(*count.borrow(), 2);
        assert_eq!(chain.process_args(), Some(&ProcessArgs::success()));
        assert_eq!(chain.current_step(), None);
    }

    #[test]
    fn test_finish_twice_notifies_once() {
        // Arrange
        let log = Log::default();
        let mut chain = Chain::new(steps![scripted("a", &log, waiting)]);
        let count = count_completions(&mut chain);
        chain.start(None);
        chain.pause();

        // Act
        chain.finish();
        chain.finish();

        // Assert
        assert_eq!(*count.borrow(), 2);
        assert!(chain.is_empty());
    }

    #[test]
    fn test_finishing_with_an_entered_step_is_reported() {
        // Arrange
        let log = Log::default();
        let mut chain = Chain::with_config(
            ChainConfig::lenient(),
            steps![scripted("a", &log, waiting), scripted("b", &log, waiting)],
        );
        chain.start(None);
        let count = count_completions(&mut chain);

        // Act
        chain.finish();

        // Assert
        assert_eq!(
            chain.violations(),
            [ProtocolViolation::StillEntered { step: "a".into() }]
        );
        assert_eq!(*count.borrow(), 2);
        assert!(chain.is_empty());
    }

    #[test]
    fn test_before_completed_fires_before_completed() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut chain = Chain::new(Vec::new());
        let first = Rc::clone(&order);
        chain.on_completed(move |_| first.borrow_mut().push("completed"));
        let second = Rc::clone(&order);
        chain.on_before_completed(move |_| second.borrow_mut().push("before"));

        chain.start(None);

        assert_eq!(*order.borrow(), vec!["before", "completed"]);
    }

    #[test]
    fn test_second_start_is_ignored() {
        // Arrange
        let log = Log::default();
        let mut chain = Chain::with_config(
            ChainConfig::lenient(),
            steps![scripted("a", &log, waiting)],
        );
        chain.start(None);

        // Act
        chain.start(Some(ProcessArgs::failed(Some("late"))));

        // Assert
        assert_eq!(*log.borrow(), vec!["a:enter"]);
        assert_eq!(chain.process_args(), Some(&ProcessArgs::success()));
        assert_eq!(chain.violations(), [ProtocolViolation::AlreadyStarted]);
    }

    #[test]
    fn test_supplied_args_are_carried_to_completion() {
        let log = Log::default();
        let mut chain = Chain::new(steps![scripted("a", &log, finishing)]);
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        chain.on_completed(move |args| *sink.borrow_mut() = Some(args.clone()));

        chain.start(Some(ProcessArgs::success().with_message("boot")));

        assert_eq!(
            *seen.borrow(),
            Some(ProcessArgs::success().with_message("boot"))
        );
    }

    #[test]
    fn test_requests_after_finish_apply_to_the_next_step() {
        // Arrange
        let log = Log::default();
        let mut chain = Chain::new(steps![
            scripted("a", &log, |ctx| {
                ctx.finish();
                ctx.set_next_step(scripted("x", &Log::default(), waiting));
            }),
            scripted("b", &log, waiting),
            scripted("c", &log, waiting),
        ]);

        // Act
        chain.start(None);

        // Assert
        assert_eq!(*log.borrow(), vec!["a:enter", "a:finish", "b:enter"]);
        assert_eq!(chain.step_names(), vec!["b", "x", "c"]);
    }

    #[test]
    fn test_report_for_dequeued_step_is_a_no_op() {
        // Arrange
        let log = Log::default();
        let mut chain = Chain::with_config(
            ChainConfig::lenient(),
            steps![scripted("a", &log, waiting), scripted("b", &log, waiting)],
        );
        chain.start(None);
        let a = chain.current_step().unwrap();
        chain.finish_step(a);

        // Act
        chain.finish_step(a);

        // Assert
        assert_eq!(*log.borrow(), vec!["a:enter", "a:finish", "b:enter"]);
        assert_eq!(chain.violations(), [ProtocolViolation::UnknownStep { id: a }]);
        assert!(!chain.is_finished());
    }

    #[test]
    fn test_mismatched_report_uses_the_current_step_when_lenient() {
        // Arrange
        let log = Log::default();
        let mut chain = Chain::with_config(
            ChainConfig::lenient(),
            steps![scripted("a", &log, waiting), scripted("b", &log, waiting)],
        );
        chain.start(None);
        let b = chain.step_ids()[1];

        // Act
        chain.finish_step(b);

        // Assert
        assert_eq!(*log.borrow(), vec!["a:enter", "a:finish", "b:enter"]);
        assert_eq!(
            chain.violations(),
            [ProtocolViolation::StepMismatch {
                reporter: "b".into(),
                current: "a".into(),
            }]
        );
    }

    #[test]
    #[should_panic(expected = "is going to be completed")]
    fn test_mismatched_report_panics_when_strict() {
        let log = Log::default();
        let mut chain = Chain::with_config(
            ChainConfig::strict(),
            steps![scripted("a", &log, waiting), scripted("b", &log, waiting)],
        );
        chain.start(None);
        let b = chain.step_ids()[1];

        chain.finish_step(b);
    }

    #[test]
    fn test_control_before_start_is_rejected() {
        let log = Log::default();
        let mut chain = Chain::with_config(
            ChainConfig::lenient(),
            steps![scripted("a", &log, waiting)],
        );
        let a = chain.step_ids()[0];

        chain.pause();
        chain.interrupt();
        chain.finish_step(a);

        assert!(log.borrow().is_empty());
        assert!(!chain.is_finished());
        assert_eq!(chain.violations().len(), 3);
    }

    #[test]
    fn test_mutating_a_finished_chain_is_ignored() {
        // Arrange
        let log = Log::default();
        let mut chain = Chain::with_config(ChainConfig::lenient(), Vec::new());
        chain.start(None);

        // Act
        chain.push_step(scripted("a", &log, waiting));
        chain.set_next_step(scripted("b", &log, waiting));
        chain.replace_step(scripted("c", &log, waiting));

        // Assert
        assert!(chain.is_empty());
        assert!(log.borrow().is_empty());
        assert_eq!(
            chain.violations(),
            [
                ProtocolViolation::ChainFinished { operation: "push" },
                ProtocolViolation::ChainFinished {
                    operation: "set_next"
                },
                ProtocolViolation::ChainFinished {
                    operation: "replace"
                },
            ]
        );
    }

    #[test]
    fn test_replace_with_nothing_skips_the_current_step() {
        let log = Log::default();
        let mut chain = Chain::new(steps![scripted("a", &log, waiting)]);
        let count = count_completions(&mut chain);
        chain.start(None);

        chain.replace(Vec::new());

        assert_eq!(*log.borrow(), vec!["a:enter", "a:finish"]);
        assert!(chain.is_finished());
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_queue_edits_before_start_enter_nothing() {
        // Arrange
        let log = Log::default();
        let mut chain = Chain::new(steps![scripted("a", &log, waiting)]);

        // Act
        chain.push_step(scripted("b", &log, waiting));
        chain.set_next_step(scripted("c", &log, waiting));
        chain.replace_step(scripted("d", &log, waiting));

        // Assert
        assert!(log.borrow().is_empty());
        assert_eq!(chain.step_names(), vec!["d", "c", "a"]);
        assert_eq!(chain.current_step(), None);
    }

    #[test]
    fn test_create_and_run_starts_immediately() {
        let log = Log::default();

        let chain = Chain::create_and_run(steps![
            scripted("a", &log, finishing),
            scripted("b", &log, finishing),
        ]);

        assert!(chain.is_finished());
        assert_eq!(
            *log.borrow(),
            vec!["a:enter", "a:finish", "b:enter", "b:finish"]
        );
    }
}
