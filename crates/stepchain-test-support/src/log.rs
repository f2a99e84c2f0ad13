//! Hook log: a shared, ordered record of step hook invocations.

use std::sync::{Arc, Mutex};

/// Ordered record of `"<step>:<hook>"` entries shared between the steps of
/// a test and its assertions. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct HookLog(Arc<Mutex<Vec<String>>>);

impl HookLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `"<step>:<hook>"`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn record(&self, step: &str, hook: &str) {
        self.0.lock().unwrap().push(format!("{step}:{hook}"));
    }

    /// Returns a snapshot of every entry, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Returns the hooks recorded for `step`, oldest first, without the
    /// step prefix.
    pub fn hooks_of(&self, step: &str) -> Vec<String> {
        let prefix = format!("{step}:");
        self.entries()
            .into_iter()
            .filter_map(|entry| entry.strip_prefix(&prefix).map(str::to_owned))
            .collect()
    }

    /// Returns the steps that recorded `hook`, in order.
    pub fn steps_with(&self, hook: &str) -> Vec<String> {
        let suffix = format!(":{hook}");
        self.entries()
            .into_iter()
            .filter_map(|entry| entry.strip_suffix(&suffix).map(str::to_owned))
            .collect()
    }
}
