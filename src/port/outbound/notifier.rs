//! Notifier port for event notifications.
//!
//! This module defines the trait for sending notifications about warmup
//! progress: executed actions, retired accounts, exchange top-ups and the
//! end of a run.

use crate::domain::{Amount, Chain, Route};

/// Events that can trigger notifications.
#[derive(Debug, Clone)]
pub enum Event {
    /// A run started against the loaded account database.
    RunStarted {
        /// Accounts with remaining work.
        accounts: usize,
        /// Worker tasks spawned.
        workers: usize,
    },
    /// A route action finished (success or failure).
    ActionCompleted(ActionEvent),
    /// An account exhausted its quota and was removed.
    AccountRetired {
        /// The retired account's address.
        address: String,
    },
    /// An exchange top-up finished.
    WithdrawalFinished(WithdrawalEvent),
    /// Every account is done.
    RunFinished(SummaryEvent),
    /// The run stopped on an unrecoverable error.
    RunAborted {
        /// The error that stopped the run.
        reason: String,
    },
}

/// Route action event.
#[derive(Debug, Clone)]
pub struct ActionEvent {
    pub address: String,
    pub route: Route,
    pub amount: Amount,
    pub success: bool,
}

/// Exchange withdrawal event.
#[derive(Debug, Clone)]
pub struct WithdrawalEvent {
    pub address: String,
    pub chain: Chain,
    pub amount: Amount,
    pub received: bool,
    /// Terminal state of the withdrawal, e.g. `received` or `timed out`.
    pub outcome: String,
}

/// End-of-run totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryEvent {
    pub actions_succeeded: u64,
    pub actions_failed: u64,
    pub accounts_retired: u64,
}

/// Trait for notification handlers.
///
/// Notifications are fire-and-forget: `notify` must return quickly and
/// implementations that do network I/O hand the event to a background task.
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A no-op notifier for tests or when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}
