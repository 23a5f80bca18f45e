//! Funding gate: top up an account from the exchange before an action.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::retry::RetryPolicy;
use super::withdrawal::{WithdrawalMonitor, WithdrawalOutcome};
use crate::domain::{Account, Amount, AmountRange, Asset, Chain};
use crate::port::outbound::chain::ChainClient;
use crate::port::outbound::exchange::WithdrawalRequest;
use crate::port::outbound::notifier::{Event, NotifierRegistry, WithdrawalEvent};

/// Per-chain top-up rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FundingRule {
    #[serde(default)]
    pub enabled: bool,
    /// Range the withdrawal amount is drawn from.
    pub amount: AmountRange,
    /// Top up when the native balance is at or below this.
    #[serde(default)]
    pub min_balance: Amount,
    /// Exchange withdrawal fee on this network.
    #[serde(default)]
    pub fee: Amount,
}

/// What the gate did before an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundingOutcome {
    /// No enabled rule for the chain.
    NotConfigured,
    /// Balance is above the threshold.
    Sufficient { balance: Amount },
    /// A withdrawal was attempted; see the monitor's outcome.
    Withdrawal {
        amount: Amount,
        outcome: WithdrawalOutcome,
    },
    /// The balance read failed; the action goes ahead regardless.
    BalanceUnavailable { reason: String },
    /// The amount range has no value at the configured precision.
    NothingToDraw,
}

impl FundingOutcome {
    /// Whether a withdrawal was made and confirmed.
    #[must_use]
    pub const fn topped_up(&self) -> bool {
        matches!(
            self,
            Self::Withdrawal {
                outcome: WithdrawalOutcome::Received { .. },
                ..
            }
        )
    }
}

/// Checks source-chain balance and withdraws from the exchange when low.
///
/// Failures never abort the action: the gate only reports what it did.
pub struct FundingGate {
    chain: Arc<dyn ChainClient>,
    monitor: Option<WithdrawalMonitor>,
    rules: HashMap<Chain, FundingRule>,
    round_to: u32,
    retry: RetryPolicy,
    notifier: Arc<NotifierRegistry>,
    rng: Mutex<StdRng>,
}

impl FundingGate {
    /// Build a gate. Without a monitor every chain is treated as unconfigured.
    #[must_use]
    pub fn new(
        chain: Arc<dyn ChainClient>,
        monitor: Option<WithdrawalMonitor>,
        rules: HashMap<Chain, FundingRule>,
        round_to: u32,
    ) -> Self {
        Self {
            chain,
            monitor,
            rules,
            round_to,
            retry: RetryPolicy::default(),
            notifier: Arc::new(NotifierRegistry::new()),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<NotifierRegistry>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Make sure `account` has gas on `chain`, withdrawing if needed.
    pub async fn ensure_funded(&self, account: &Account, chain: Chain) -> FundingOutcome {
        let Some(monitor) = self.monitor.as_ref() else {
            return FundingOutcome::NotConfigured;
        };
        let Some(rule) = self.rules.get(&chain).filter(|rule| rule.enabled) else {
            return FundingOutcome::NotConfigured;
        };

        let balance = match self
            .retry
            .run("native balance", || self.chain.native_balance(account, chain))
            .await
        {
            Ok(balance) => balance,
            Err(e) => {
                warn!(address = %account.address, chain = %chain, error = %e, "Balance check failed");
                return FundingOutcome::BalanceUnavailable {
                    reason: e.to_string(),
                };
            }
        };

        if balance > rule.min_balance {
            debug!(address = %account.address, chain = %chain, balance = %balance, "Balance sufficient");
            return FundingOutcome::Sufficient { balance };
        }

        let drawn = rule.amount.sample(&mut *self.rng.lock(), self.round_to);
        let Some(amount) = drawn.filter(|amount| *amount > Decimal::ZERO) else {
            warn!(chain = %chain, "Funding amount range has nothing to draw");
            return FundingOutcome::NothingToDraw;
        };

        info!(
            address = %account.address,
            chain = %chain,
            balance = %balance,
            min_balance = %rule.min_balance,
            amount = %amount,
            "Balance low, withdrawing from exchange"
        );

        let request = WithdrawalRequest::native(chain, amount, &account.address, rule.fee);
        let outcome = monitor
            .withdraw(account, &request, &Asset::Native(chain))
            .await;

        self.notifier
            .notify_all(Event::WithdrawalFinished(WithdrawalEvent {
                address: account.address.clone(),
                chain,
                amount,
                received: outcome.is_received(),
                outcome: outcome.to_string(),
            }));

        FundingOutcome::Withdrawal { amount, outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::withdrawal::WithdrawalState;
    use crate::error::ChainError;
    use crate::testkit::chain::ScriptedChain;
    use crate::testkit::config::withdrawal_timing;
    use crate::testkit::domain::account;
    use crate::testkit::exchange::ScriptedExchange;
    use crate::testkit::notifier::RecordingNotifier;
    use rust_decimal_macros::dec;

    fn rule(enabled: bool) -> FundingRule {
        FundingRule {
            enabled,
            amount: AmountRange::new(dec!(0.01), dec!(0.02)),
            min_balance: dec!(0.005),
            fee: dec!(0.002),
        }
    }

    fn gate(
        chain: Arc<ScriptedChain>,
        exchange: Arc<ScriptedExchange>,
        bsc_rule: FundingRule,
    ) -> FundingGate {
        let monitor = WithdrawalMonitor::new(exchange, chain.clone(), withdrawal_timing());
        FundingGate::new(
            chain,
            Some(monitor),
            HashMap::from([(Chain::Bsc, bsc_rule)]),
            5,
        )
        .with_retry(RetryPolicy::once())
        .with_rng(StdRng::seed_from_u64(7))
    }

    #[tokio::test]
    async fn without_monitor_nothing_is_configured() {
        let chain = Arc::new(ScriptedChain::new());
        let gate = FundingGate::new(
            chain.clone(),
            None,
            HashMap::from([(Chain::Bsc, rule(true))]),
            5,
        );
        let outcome = gate.ensure_funded(&account("0xa"), Chain::Bsc).await;
        assert_eq!(outcome, FundingOutcome::NotConfigured);
        assert_eq!(chain.native_balance_calls(), 0);
    }

    #[tokio::test]
    async fn disabled_and_missing_rules_are_skipped() {
        let chain = Arc::new(ScriptedChain::new());
        let exchange = Arc::new(ScriptedExchange::new());
        let gate = gate(chain.clone(), exchange.clone(), rule(false));

        let on_bsc = gate.ensure_funded(&account("0xa"), Chain::Bsc).await;
        let on_celo = gate.ensure_funded(&account("0xa"), Chain::Celo).await;

        assert_eq!(on_bsc, FundingOutcome::NotConfigured);
        assert_eq!(on_celo, FundingOutcome::NotConfigured);
        assert_eq!(exchange.submit_count(), 0);
    }

    #[tokio::test]
    async fn balance_above_threshold_skips_withdrawal() {
        let chain = Arc::new(ScriptedChain::new().with_native_balances(vec![dec!(0.1)]));
        let exchange = Arc::new(ScriptedExchange::new());
        let gate = gate(chain, exchange.clone(), rule(true));

        let outcome = gate.ensure_funded(&account("0xa"), Chain::Bsc).await;

        assert_eq!(outcome, FundingOutcome::Sufficient { balance: dec!(0.1) });
        assert_eq!(exchange.submit_count(), 0);
    }

    #[tokio::test]
    async fn balance_at_threshold_triggers_withdrawal() {
        // gate read, monitor snapshot, then the receipt poll sees the deposit
        let chain = Arc::new(ScriptedChain::new().with_native_balances(vec![
            dec!(0.005),
            dec!(0.005),
            dec!(0.02),
        ]));
        let exchange = Arc::new(ScriptedExchange::new());
        let recorder = RecordingNotifier::new();
        let mut registry = NotifierRegistry::new();
        registry.register(Box::new(recorder.clone()));
        let gate = gate(chain, exchange.clone(), rule(true)).with_notifier(Arc::new(registry));

        let outcome = gate.ensure_funded(&account("0xa"), Chain::Bsc).await;

        assert!(outcome.topped_up());
        let FundingOutcome::Withdrawal { amount, .. } = outcome else {
            panic!("expected a withdrawal, got {outcome:?}");
        };
        assert!(amount >= dec!(0.01) && amount <= dec!(0.02));

        let requests = exchange.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].currency, "BNB");
        assert_eq!(requests[0].address, "0xa");
        assert_eq!(requests[0].fee, dec!(0.002));
        assert_eq!(requests[0].amount, amount);

        assert_eq!(
            recorder.count(|e| matches!(e, Event::WithdrawalFinished(w) if w.received)),
            1
        );
    }

    #[tokio::test]
    async fn failed_balance_read_does_not_withdraw() {
        let chain = Arc::new(
            ScriptedChain::new()
                .with_native_results(vec![Err(ChainError::Rpc("timeout".into()).into())]),
        );
        let exchange = Arc::new(ScriptedExchange::new());
        let gate = gate(chain, exchange.clone(), rule(true));

        let outcome = gate.ensure_funded(&account("0xa"), Chain::Bsc).await;

        assert!(matches!(outcome, FundingOutcome::BalanceUnavailable { .. }));
        assert_eq!(exchange.submit_count(), 0);
    }

    #[tokio::test]
    async fn rejected_withdrawal_is_reported_not_raised() {
        let chain = Arc::new(ScriptedChain::new().with_native_balances(vec![dec!(0)]));
        let exchange = Arc::new(ScriptedExchange::not_allowlisted());
        let gate = gate(chain, exchange.clone(), rule(true));

        let outcome = gate.ensure_funded(&account("0xa"), Chain::Bsc).await;

        let FundingOutcome::Withdrawal { outcome, .. } = outcome else {
            panic!("expected a withdrawal attempt");
        };
        assert_eq!(outcome.state(), WithdrawalState::Rejected);
        assert_eq!(exchange.submit_count(), 1);
        assert_eq!(exchange.status_count(), 0);
    }
}
