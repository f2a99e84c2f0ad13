//! Action step: runs a closure as one step of a sequence.

use stepchain_core::{Step, StepContext};

/// Runs `action` once on enter, then finishes.
pub struct ActionStep<F> {
    name: String,
    action: Option<F>,
}

impl<F> ActionStep<F>
where
    F: FnOnce(),
{
    /// Wraps `action`. The step reports itself as `name` in diagnostics.
    #[must_use]
    pub fn new(name: impl Into<String>, action: F) -> Self {
        Self {
            name: name.into(),
            action: Some(action),
        }
    }
}

impl<F> Step for ActionStep<F>
where
    F: FnOnce(),
{
    fn name(&self) -> String {
        self.name.clone()
    }

    fn on_enter(&mut self, ctx: &mut StepContext) {
        if let Some(action) = self.action.take() {
            tracing::debug!(step = %self.name, "running action");
            action();
        }
        ctx.finish();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use stepchain_core::{Chain, steps};

    use super::*;

    #[test]
    fn test_actions_run_in_sequence() {
        // Arrange
        let calls = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&calls);
        let second = Rc::clone(&calls);

        // Act
        let chain = Chain::create_and_run(steps![
            ActionStep::new("first", move || first.borrow_mut().push("first")),
            ActionStep::new("second", move || second.borrow_mut().push("second")),
        ]);

        // Assert
        assert!(chain.is_finished());
        assert!(chain.process_args().unwrap().is_success());
        assert_eq!(*calls.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_name_is_the_given_label() {
        let step = ActionStep::new("init audio", || {});

        assert_eq!(step.name(), "init audio");
    }
}
