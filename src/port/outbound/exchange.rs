//! Exchange port for funding withdrawals.

use async_trait::async_trait;

use crate::domain::{Amount, Chain};
use crate::error::Result;

/// A withdrawal from the exchange to an on-chain address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRequest {
    /// Currency symbol as the exchange names it, e.g. `BNB`.
    pub currency: String,
    pub amount: Amount,
    /// Destination chain.
    pub chain: Chain,
    /// Exchange network identifier, e.g. `BNB-BSC`.
    pub network: String,
    /// Destination address.
    pub address: String,
    /// Withdrawal fee the exchange charges on this network.
    pub fee: Amount,
}

impl WithdrawalRequest {
    /// Withdraw `amount` of `chain`'s native coin to `address`.
    #[must_use]
    pub fn native(chain: Chain, amount: Amount, address: &str, fee: Amount) -> Self {
        let currency = chain.native_symbol();
        Self {
            currency: currency.to_string(),
            amount,
            chain,
            network: format!("{currency}-{}", chain.exchange_network()),
            address: address.to_string(),
            fee,
        }
    }
}

/// Exchange-side state of a submitted withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawalStatus {
    /// Still in flight; carries the exchange's own description.
    Pending(String),
    /// Broadcast on chain by the exchange.
    Complete,
    /// Cancelled by the exchange or the user.
    Cancelled,
}

/// Exchange client used by the withdrawal monitor.
///
/// Terminal rejections are reported as
/// [`ExchangeError`](crate::error::ExchangeError) variants for which
/// `is_terminal()` holds.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Submit a withdrawal and return the exchange's withdrawal id.
    async fn submit_withdrawal(&self, request: &WithdrawalRequest) -> Result<String>;

    /// Current status of a submitted withdrawal.
    async fn withdrawal_status(&self, id: &str) -> Result<WithdrawalStatus>;
}
