//! Exchange withdrawal monitor.
//!
//! Drives one withdrawal from submission to on-chain receipt:
//!
//! ```text
//! Submitted ──► ConfirmingExchangeSide ──► AwaitingOnChainReceipt ──► Received
//!     │                  │    │                       │
//!     ▼                  ▼    ▼                       ▼
//!  Rejected          Cancelled TimedOut            TimedOut
//! ```
//!
//! Every wait is bounded by the configured attempt ceilings; the monitor
//! never returns an error, only a [`WithdrawalOutcome`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::{Account, Amount, Asset};
use crate::error::Error;
use crate::port::outbound::chain::ChainClient;
use crate::port::outbound::exchange::{ExchangeClient, WithdrawalRequest, WithdrawalStatus};

/// States of a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalState {
    Submitted,
    ConfirmingExchangeSide,
    AwaitingOnChainReceipt,
    Received,
    Rejected,
    Cancelled,
    TimedOut,
}

impl fmt::Display for WithdrawalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Submitted => "submitted",
            Self::ConfirmingExchangeSide => "confirming on exchange",
            Self::AwaitingOnChainReceipt => "awaiting on-chain receipt",
            Self::Received => "received",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed out",
        };
        f.write_str(label)
    }
}

/// Terminal result of [`WithdrawalMonitor::withdraw`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawalOutcome {
    /// The destination balance rose above the pre-submission snapshot.
    Received {
        id: String,
        before: Amount,
        after: Amount,
    },
    /// Submission failed terminally or ran out of retries.
    Rejected { reason: String },
    /// The exchange cancelled the withdrawal.
    Cancelled { id: String },
    /// An attempt ceiling was reached while in `stage`.
    TimedOut {
        id: String,
        stage: WithdrawalState,
    },
}

impl WithdrawalOutcome {
    #[must_use]
    pub const fn is_received(&self) -> bool {
        matches!(self, Self::Received { .. })
    }

    #[must_use]
    pub const fn state(&self) -> WithdrawalState {
        match self {
            Self::Received { .. } => WithdrawalState::Received,
            Self::Rejected { .. } => WithdrawalState::Rejected,
            Self::Cancelled { .. } => WithdrawalState::Cancelled,
            Self::TimedOut { .. } => WithdrawalState::TimedOut,
        }
    }
}

impl fmt::Display for WithdrawalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received { .. } | Self::Cancelled { .. } => self.state().fmt(f),
            Self::Rejected { reason } => write!(f, "rejected: {reason}"),
            Self::TimedOut { stage, .. } => write!(f, "timed out while {stage}"),
        }
    }
}

/// Retry budget and polling cadence, in configuration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WithdrawalTiming {
    /// Extra submission attempts after the first.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_cooldown_secs")]
    pub retry_cooldown_secs: u64,
    #[serde(default = "default_status_poll_interval_secs")]
    pub status_poll_interval_secs: u64,
    #[serde(default = "default_poll_attempts")]
    pub status_poll_attempts: u32,
    #[serde(default = "default_receipt_poll_interval_secs")]
    pub receipt_poll_interval_secs: u64,
    #[serde(default = "default_poll_attempts")]
    pub receipt_poll_attempts: u32,
}

const fn default_retry_count() -> u32 {
    5
}

const fn default_retry_cooldown_secs() -> u64 {
    60
}

const fn default_status_poll_interval_secs() -> u64 {
    10
}

const fn default_receipt_poll_interval_secs() -> u64 {
    60
}

const fn default_poll_attempts() -> u32 {
    100
}

impl Default for WithdrawalTiming {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_cooldown_secs: default_retry_cooldown_secs(),
            status_poll_interval_secs: default_status_poll_interval_secs(),
            status_poll_attempts: default_poll_attempts(),
            receipt_poll_interval_secs: default_receipt_poll_interval_secs(),
            receipt_poll_attempts: default_poll_attempts(),
        }
    }
}

impl WithdrawalTiming {
    /// Same budgets with every pause removed.
    #[must_use]
    pub const fn without_pauses(self) -> Self {
        Self {
            retry_cooldown_secs: 0,
            status_poll_interval_secs: 0,
            receipt_poll_interval_secs: 0,
            ..self
        }
    }
}

/// Runs withdrawals against an exchange and watches the chain for receipt.
pub struct WithdrawalMonitor {
    exchange: Arc<dyn ExchangeClient>,
    chain: Arc<dyn ChainClient>,
    timing: WithdrawalTiming,
}

impl WithdrawalMonitor {
    #[must_use]
    pub fn new(
        exchange: Arc<dyn ExchangeClient>,
        chain: Arc<dyn ChainClient>,
        timing: WithdrawalTiming,
    ) -> Self {
        Self {
            exchange,
            chain,
            timing,
        }
    }

    /// Withdraw per `request` and wait until `asset` arrives on `account`.
    pub async fn withdraw(
        &self,
        account: &Account,
        request: &WithdrawalRequest,
        asset: &Asset,
    ) -> WithdrawalOutcome {
        let before = match self.chain.balance(account, asset).await {
            Ok(balance) => balance,
            Err(e) => {
                return WithdrawalOutcome::Rejected {
                    reason: format!("balance snapshot failed: {e}"),
                }
            }
        };

        let outcome = match self.submit(request).await {
            Ok(id) => self.follow(account, asset, id, before).await,
            Err(outcome) => outcome,
        };

        info!(
            address = %account.address,
            currency = %request.currency,
            amount = %request.amount,
            outcome = %outcome,
            "Withdrawal finished"
        );
        outcome
    }

    async fn follow(
        &self,
        account: &Account,
        asset: &Asset,
        id: String,
        before: Amount,
    ) -> WithdrawalOutcome {
        if let Err(outcome) = self.confirm(&id).await {
            return outcome;
        }
        self.await_receipt(account, asset, id, before).await
    }

    /// `Submitted`: send the request, retrying transient failures.
    async fn submit(&self, request: &WithdrawalRequest) -> Result<String, WithdrawalOutcome> {
        let attempts = self.timing.retry_count + 1;
        let cooldown = Duration::from_secs(self.timing.retry_cooldown_secs);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.exchange.submit_withdrawal(request).await {
                Ok(id) => {
                    info!(
                        id = %id,
                        currency = %request.currency,
                        amount = %request.amount,
                        network = %request.network,
                        "Withdrawal submitted"
                    );
                    return Ok(id);
                }
                Err(Error::Exchange(e)) if e.is_terminal() => {
                    warn!(error = %e, "Withdrawal rejected");
                    return Err(WithdrawalOutcome::Rejected {
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "Withdrawal submission failed");
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(cooldown).await;
                    }
                }
            }
        }

        Err(WithdrawalOutcome::Rejected {
            reason: format!("retries exhausted: {last_error}"),
        })
    }

    /// `ConfirmingExchangeSide`: wait for the exchange to broadcast.
    async fn confirm(&self, id: &str) -> Result<(), WithdrawalOutcome> {
        let attempts = self.timing.status_poll_attempts;
        let interval = Duration::from_secs(self.timing.status_poll_interval_secs);

        for attempt in 1..=attempts {
            match self.exchange.withdrawal_status(id).await {
                Ok(WithdrawalStatus::Complete) => {
                    debug!(id, attempt, "Exchange completed withdrawal");
                    return Ok(());
                }
                Ok(WithdrawalStatus::Cancelled) => {
                    warn!(id, "Withdrawal cancelled by exchange");
                    return Err(WithdrawalOutcome::Cancelled { id: id.to_string() });
                }
                Ok(WithdrawalStatus::Pending(state)) => {
                    debug!(id, attempt, state = %state, "Withdrawal pending");
                }
                Err(e) => {
                    warn!(id, attempt, error = %e, "Withdrawal status poll failed");
                }
            }
            if attempt < attempts {
                tokio::time::sleep(interval).await;
            }
        }

        Err(WithdrawalOutcome::TimedOut {
            id: id.to_string(),
            stage: WithdrawalState::ConfirmingExchangeSide,
        })
    }

    /// `AwaitingOnChainReceipt`: wait for the balance to rise.
    async fn await_receipt(
        &self,
        account: &Account,
        asset: &Asset,
        id: String,
        before: Amount,
    ) -> WithdrawalOutcome {
        let attempts = self.timing.receipt_poll_attempts;
        let interval = Duration::from_secs(self.timing.receipt_poll_interval_secs);

        for attempt in 1..=attempts {
            match self.chain.balance(account, asset).await {
                Ok(after) if after > before => {
                    return WithdrawalOutcome::Received { id, before, after };
                }
                Ok(balance) => {
                    debug!(id = %id, attempt, balance = %balance, "Waiting for funds");
                }
                Err(e) => {
                    warn!(id = %id, attempt, error = %e, "Balance poll failed");
                }
            }
            if attempt < attempts {
                tokio::time::sleep(interval).await;
            }
        }

        WithdrawalOutcome::TimedOut {
            id,
            stage: WithdrawalState::AwaitingOnChainReceipt,
        }
    }
}
