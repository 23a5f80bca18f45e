//! Chain RPC port.

use async_trait::async_trait;

use crate::domain::{Account, Amount, Asset, Chain, Token};
use crate::error::Result;

/// An unsigned transaction for the client to sign, send and confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    /// Hex-encoded target address.
    pub to: String,
    /// ABI-encoded calldata.
    pub data: Vec<u8>,
    /// Native value attached, in wei.
    pub value: u128,
}

impl TxRequest {
    #[must_use]
    pub fn new(to: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            to: to.into(),
            data,
            value: 0,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: u128) -> Self {
        self.value = value;
        self
    }
}

/// Read and write access to EVM chains on behalf of an account.
///
/// Gas estimation and fee calculation are the implementation's concern.
/// `send_and_confirm` returns the transaction hash once the receipt reports
/// success; a reverted transaction is an error.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Native coin balance in whole units.
    async fn native_balance(&self, account: &Account, chain: Chain) -> Result<Amount>;

    /// ERC-20 balance in whole units.
    async fn token_balance(&self, account: &Account, token: &Token) -> Result<Amount>;

    /// Read-only contract call, returning the raw ABI-encoded output.
    async fn call(&self, chain: Chain, to: &str, data: Vec<u8>) -> Result<Vec<u8>>;

    /// Sign with the account key, send, and wait for a successful receipt.
    async fn send_and_confirm(&self, account: &Account, chain: Chain, tx: TxRequest)
        -> Result<String>;

    /// Balance of either kind of asset.
    async fn balance(&self, account: &Account, asset: &Asset) -> Result<Amount> {
        match asset {
            Asset::Native(chain) => self.native_balance(account, *chain).await,
            Asset::Erc20(token) => self.token_balance(account, token).await,
        }
    }
}
