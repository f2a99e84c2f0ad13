//! Scripted step: a `Step` that logs its hooks and runs a test script.

use stepchain_core::{Step, StepContext};

use crate::log::HookLog;

type EnterScript = Box<dyn FnMut(&mut StepContext, u32)>;
type StartScript = Box<dyn FnMut(&mut StepContext)>;

/// A step that records every hook in a [`HookLog`] and runs a script on
/// enter. The script receives the enter count, starting at 1, so a test can
/// behave differently on the first enter and on resumes.
pub struct ScriptedStep {
    name: String,
    log: HookLog,
    enters: u32,
    on_enter: EnterScript,
    on_start: Option<StartScript>,
}

impl std::fmt::Debug for ScriptedStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedStep")
            .field("name", &self.name)
            .field("enters", &self.enters)
            .finish_non_exhaustive()
    }
}

impl ScriptedStep {
    /// A step that runs `script` on every enter.
    #[must_use]
    pub fn new(
        name: &str,
        log: &HookLog,
        script: impl FnMut(&mut StepContext, u32) + 'static,
    ) -> Self {
        Self {
            name: name.to_owned(),
            log: log.clone(),
            enters: 0,
            on_enter: Box::new(script),
            on_start: None,
        }
    }

    /// A step that stays entered until completed from outside.
    #[must_use]
    pub fn waiting(name: &str, log: &HookLog) -> Self {
        Self::new(name, log, |_, _| {})
    }

    /// A step that finishes as soon as it is entered.
    #[must_use]
    pub fn finishing(name: &str, log: &HookLog) -> Self {
        Self::new(name, log, |ctx, _| ctx.finish())
    }

    /// A step that interrupts as soon as it is entered.
    #[must_use]
    pub fn interrupting(name: &str, log: &HookLog, message: Option<&str>) -> Self {
        let message = message.map(str::to_owned);
        Self::new(name, log, move |ctx, _| match &message {
            Some(message) => ctx.interrupt_with(message.clone()),
            None => ctx.interrupt(),
        })
    }

    /// A step that waits on its first enter and finishes when resumed.
    #[must_use]
    pub fn finishing_on_resume(name: &str, log: &HookLog) -> Self {
        Self::new(name, log, |ctx, enters| {
            if enters > 1 {
                ctx.finish();
            }
        })
    }

    /// Also runs `script` from `on_start`.
    #[must_use]
    pub fn with_start(mut self, script: impl FnMut(&mut StepContext) + 'static) -> Self {
        self.on_start = Some(Box::new(script));
        self
    }
}

impl Step for ScriptedStep {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn on_start(&mut self, ctx: &mut StepContext) {
        self.log.record(&self.name, "start");
        if let Some(script) = self.on_start.as_mut() {
            script(ctx);
        }
    }

    fn on_enter(&mut self, ctx: &mut StepContext) {
        self.enters += 1;
        self.log.record(&self.name, "enter");
        (self.on_enter)(ctx, self.enters);
    }

    fn on_resume(&mut self, _ctx: &mut StepContext) {
        self.log.record(&self.name, "resume");
    }

    fn on_exit(&mut self) {
        self.log.record(&self.name, "exit");
    }

    fn on_pause(&mut self) {
        self.log.record(&self.name, "pause");
    }

    fn on_finish(&mut self) {
        self.log.record(&self.name, "finish");
    }

    fn on_interrupt(&mut self) {
        self.log.record(&self.name, "interrupt");
    }
}
