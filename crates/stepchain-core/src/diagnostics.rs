//! Violation sink shared by a chain and its step slots.

use crate::config::ChainConfig;
use crate::error::ProtocolViolation;

#[derive(Debug)]
pub(crate) struct Diagnostics {
    strict: bool,
    label: String,
    violations: Vec<ProtocolViolation>,
}

impl Diagnostics {
    pub(crate) fn new(config: &ChainConfig) -> Self {
        Self {
            strict: config.strict,
            label: config.label().to_owned(),
            violations: Vec::new(),
        }
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn violations(&self) -> &[ProtocolViolation] {
        &self.violations
    }

    /// Logs and records `violation`. Invariant violations panic in strict mode.
    pub(crate) fn report(&mut self, violation: ProtocolViolation) {
        if violation.is_invariant() {
            tracing::error!(chain = %self.label, "{violation}");
        } else {
            tracing::warn!(chain = %self.label, "{violation}");
        }
        let fatal = self.strict && violation.is_invariant();
        let message = violation.to_string();
        self.violations.push(violation);
        assert!(!fatal, "[{}] {message}", self.label);
    }
}
