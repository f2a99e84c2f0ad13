//! Outcome accumulator threaded through a chain run.

use serde::{Deserialize, Serialize};

/// Aggregated status of a running process: a success flag plus an ordered
/// log of diagnostic messages.
///
/// A chain owns one `ProcessArgs` per run and hands it to its completion
/// subscribers when the run ends. Steps that interrupt produce their own
/// failed `ProcessArgs`, which the chain merges into the run's args.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessArgs {
    success: bool,
    messages: Vec<String>,
}

impl Default for ProcessArgs {
    fn default() -> Self {
        Self::success()
    }
}

impl ProcessArgs {
    /// Creates successful args with no messages.
    #[must_use]
    pub fn success() -> Self {
        Self {
            success: true,
            messages: Vec::new(),
        }
    }

    /// Creates failed args, optionally carrying a message.
    ///
    /// `None` (or an empty message) yields a failure with an empty log.
    #[must_use]
    pub fn failed(message: Option<&str>) -> Self {
        let mut args = Self::success();
        match message {
            Some(message) => {
                args.fail(message);
            }
            None => args.success = false,
        }
        args
    }

    /// Builder form of [`add_message`](Self::add_message) that keeps the
    /// current status.
    #[must_use]
    pub fn with_message(mut self, message: &str) -> Self {
        self.add_message(message);
        self
    }

    /// Marks the args as failed, then appends `message`.
    pub fn fail(&mut self, message: &str) -> &mut Self {
        self.success = false;
        self.add_message(message)
    }

    /// Appends `message` to the log. Empty messages are ignored.
    pub fn add_message(&mut self, message: &str) -> &mut Self {
        if !message.is_empty() {
            self.messages.push(message.to_owned());
        }
        self
    }

    /// Absorbs `other` into `self`: a failure in `other` fails `self`, and
    /// `other`'s messages are appended after the existing ones.
    pub fn merge(&mut self, other: &ProcessArgs) -> &mut Self {
        if !other.success {
            self.success = false;
        }
        self.messages
            .extend(other.messages.iter().filter(|m| !m.is_empty()).cloned());
        self
    }

    /// Returns `true` unless something failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Returns the message log joined with newlines.
    #[must_use]
    pub fn message(&self) -> String {
        self.messages.join("\n")
    }

    /// Returns the individual messages in the order they were added.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}
