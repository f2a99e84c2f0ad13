//! Completion probe: captures a chain's completion notifications.

use std::sync::{Arc, Mutex};

use stepchain_core::{Chain, ProcessArgs};

/// Which completion channel fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// The internal before-completed channel.
    BeforeCompleted,
    /// The public completed channel.
    Completed,
}

/// Records every completion notification a chain fires, with its args.
#[derive(Debug, Clone, Default)]
pub struct CompletionProbe {
    received: Arc<Mutex<Vec<(Notification, ProcessArgs)>>>,
}

impl CompletionProbe {
    /// Subscribes a new probe to both of `chain`'s completion channels.
    ///
    /// # Panics
    ///
    /// The installed handlers panic if the internal mutex is poisoned.
    pub fn attach(chain: &mut Chain) -> Self {
        let probe = Self::default();

        let received = Arc::clone(&probe.received);
        chain.on_before_completed(move |args| {
            received
                .lock()
                .unwrap()
                .push((Notification::BeforeCompleted, args.clone()));
        });

        let received = Arc::clone(&probe.received);
        chain.on_completed(move |args| {
            received
                .lock()
                .unwrap()
                .push((Notification::Completed, args.clone()));
        });

        probe
    }

    /// Returns the channels that fired, in firing order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn notifications(&self) -> Vec<Notification> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|(notification, _)| *notification)
            .collect()
    }

    /// Returns the args delivered on the completed channel, if it fired.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn outcome(&self) -> Option<ProcessArgs> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .find(|(notification, _)| *notification == Notification::Completed)
            .map(|(_, args)| args.clone())
    }
}
