//! Protocol violation types.

use thiserror::Error;

use crate::step::StepId;

/// A misuse of the chain/step protocol.
///
/// Violations never abort a run: the chain logs them, records them and
/// carries on in the most defensive way it can. Violations for which
/// [`is_invariant`](Self::is_invariant) is `true` additionally panic when the
/// chain runs in strict mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// `start` was called on a chain that is already running or finished.
    #[error("an attempt to start an already started chain")]
    AlreadyStarted,

    /// A control operation needs a started chain.
    #[error("`{operation}` called before the chain was started")]
    NotStarted {
        /// The operation that was ignored.
        operation: &'static str,
    },

    /// A queue mutation or step report arrived after the chain finished.
    #[error("`{operation}` called on a finished chain")]
    ChainFinished {
        /// The operation that was ignored.
        operation: &'static str,
    },

    /// The step is entered and not paused, so it cannot be entered again.
    #[error("{step}: an attempt to re-enter an active (not paused) step")]
    ReenterActive {
        /// Diagnostic name of the step.
        step: String,
    },

    /// A completed step was asked to enter again.
    #[error("{step}: an attempt to enter a completed step")]
    EnterCompleted {
        /// Diagnostic name of the step.
        step: String,
    },

    /// `on_start` requested finish or interrupt; those belong in `on_enter`.
    #[error("{step}: completing a step from on_start is not allowed, do it in on_enter")]
    CompletedFromStart {
        /// Diagnostic name of the step.
        step: String,
    },

    /// Pause was requested for a step that is neither entered nor paused.
    #[error("{step}: an attempt to pause a step that is not entered")]
    PauseInactive {
        /// Diagnostic name of the step.
        step: String,
    },

    /// A step reported completion while another step is current.
    #[error("{reporter} is going to be completed, but current step is {current}")]
    StepMismatch {
        /// The step that reported.
        reporter: String,
        /// The actual head of the queue.
        current: String,
    },

    /// A single hook call completed its step more than once.
    #[error("{step}: the step was completed more than once")]
    DoubleCompletion {
        /// Diagnostic name of the step.
        step: String,
    },

    /// A completion was reported for a step that is no longer queued.
    #[error("step {id} reported completion but is not queued (already completed?)")]
    UnknownStep {
        /// The id that was reported.
        id: StepId,
    },

    /// A queued step was still entered when the chain finished.
    #[error("{step} was not exited when the chain finished")]
    StillEntered {
        /// Diagnostic name of the step.
        step: String,
    },
}

impl ProtocolViolation {
    /// Returns `true` for violations that indicate corrupted sequencing state
    /// rather than a harmless duplicate call.
    #[must_use]
    pub fn is_invariant(&self) -> bool {
        matches!(
            self,
            Self::EnterCompleted { .. }
                | Self::DoubleCompletion { .. }
                | Self::StepMismatch { .. }
                | Self::StillEntered { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_calls_are_not_invariants() {
        assert!(!ProtocolViolation::AlreadyStarted.is_invariant());
        assert!(
            !ProtocolViolation::ReenterActive {
                step: "Intro".into()
            }
            .is_invariant()
        );
        assert!(!ProtocolViolation::UnknownStep { id: StepId::new() }.is_invariant());
        assert!(
            !ProtocolViolation::ChainFinished {
                operation: "push"
            }
            .is_invariant()
        );
    }

    #[test]
    fn test_mismatch_is_an_invariant() {
        let violation = ProtocolViolation::StepMismatch {
            reporter: "Splash".into(),
            current: "Menu".into(),
        };

        assert!(violation.is_invariant());
        assert_eq!(
            violation.to_string(),
            "Splash is going to be completed, but current step is Menu"
        );
    }
}
