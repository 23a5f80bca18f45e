//! Notifier that writes every event to the tracing log.

use tracing::{info, warn};

use crate::port::outbound::notifier::{Event, Notifier};

/// Always-on notifier backed by `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        match event {
            Event::RunStarted { accounts, workers } => {
                info!(accounts, workers, "Warmup started");
            }
            Event::ActionCompleted(e) => {
                info!(
                    address = %e.address,
                    route = %e.route,
                    amount = %e.amount,
                    success = e.success,
                    "Action completed"
                );
            }
            Event::AccountRetired { address } => {
                info!(address = %address, "Account finished warmup");
            }
            Event::WithdrawalFinished(e) if e.received => {
                info!(address = %e.address, chain = %e.chain, amount = %e.amount, "Withdrawal received");
            }
            Event::WithdrawalFinished(e) => {
                warn!(
                    address = %e.address,
                    chain = %e.chain,
                    amount = %e.amount,
                    outcome = %e.outcome,
                    "Withdrawal not received"
                );
            }
            Event::RunFinished(summary) => {
                info!(
                    succeeded = summary.actions_succeeded,
                    failed = summary.actions_failed,
                    retired = summary.accounts_retired,
                    "Warmup finished"
                );
            }
            Event::RunAborted { reason } => {
                warn!(reason = %reason, "Warmup aborted");
            }
        }
    }
}
