//! [`ChainClient`] over alloy HTTP providers.
//!
//! One provider is built per call from the chain's RPC URL; signing
//! providers carry the account's local key. Gas, nonce and chain id are
//! filled by alloy's recommended fillers.

use std::collections::HashMap;
use std::str::FromStr;

use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::network::{
    Ethereum, EthereumWallet, Network, ReceiptResponse, TransactionBuilder,
};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use super::contracts::IERC20;
use crate::domain::{from_base_units, Account, Amount, Asset, Chain, Token};
use crate::error::{ChainError, ConfigError, Result};
use crate::port::outbound::chain::{ChainClient, TxRequest};

type TransactionRequest = <Ethereum as Network>::TransactionRequest;

/// Parse a hex address.
pub(crate) fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value.trim())
        .map_err(|e| ChainError::Contract(format!("invalid address {value}: {e}")).into())
}

/// Checksummed address for a hex private key.
///
/// # Errors
///
/// Returns [`ChainError::InvalidKey`] if the key does not parse.
pub fn derive_address(private_key: &str) -> Result<String> {
    Ok(signer_for(private_key)?.address().to_checksum(None))
}

fn signer_for(private_key: &str) -> Result<PrivateKeySigner> {
    PrivateKeySigner::from_str(private_key.trim())
        .map_err(|e| ChainError::InvalidKey(e.to_string()).into())
}

fn to_amount(value: U256, decimals: u32) -> Result<Amount> {
    u128::try_from(value)
        .ok()
        .and_then(|units| from_base_units(units, decimals))
        .ok_or_else(|| ChainError::Rpc(format!("balance {value} out of range")).into())
}

fn rpc_error(e: impl std::fmt::Display) -> crate::error::Error {
    ChainError::Rpc(e.to_string()).into()
}

/// Alloy-backed chain client.
pub struct AlloyChainClient {
    rpcs: HashMap<Chain, Url>,
}

impl AlloyChainClient {
    /// Build a client from per-chain RPC URLs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unparseable URL.
    #[allow(clippy::result_large_err)]
    pub fn new<'a>(rpcs: impl IntoIterator<Item = (Chain, &'a str)>) -> Result<Self> {
        let rpcs = rpcs
            .into_iter()
            .map(|(chain, url)| {
                let url = Url::parse(url).map_err(|e| ConfigError::InvalidValue {
                    field: "chains",
                    reason: format!("{chain}: {e}"),
                })?;
                Ok((chain, url))
            })
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { rpcs })
    }

    fn url(&self, chain: Chain) -> Result<Url> {
        self.rpcs
            .get(&chain)
            .cloned()
            .ok_or_else(|| ChainError::MissingRpc(chain).into())
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    async fn native_balance(&self, account: &Account, chain: Chain) -> Result<Amount> {
        let provider = ProviderBuilder::new().connect_http(self.url(chain)?);
        let owner = parse_address(&account.address)?;
        let wei = provider.get_balance(owner).await.map_err(rpc_error)?;
        to_amount(wei, Asset::NATIVE_DECIMALS)
    }

    async fn token_balance(&self, account: &Account, token: &Token) -> Result<Amount> {
        let provider = ProviderBuilder::new().connect_http(self.url(token.chain)?);
        let contract = IERC20::new(parse_address(token.address)?, &provider);
        let owner = parse_address(&account.address)?;
        let units: U256 = contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| ChainError::Contract(format!("balanceOf {}: {e}", token.symbol)))?;
        to_amount(units, token.decimals)
    }

    async fn call(&self, chain: Chain, to: &str, data: Vec<u8>) -> Result<Vec<u8>> {
        let provider = ProviderBuilder::new().connect_http(self.url(chain)?);
        let tx = TransactionRequest::default()
            .with_to(parse_address(to)?)
            .with_input(Bytes::from(data));
        let output = provider.call(tx).await.map_err(rpc_error)?;
        Ok(output.to_vec())
    }

    async fn send_and_confirm(
        &self,
        account: &Account,
        chain: Chain,
        tx: TxRequest,
    ) -> Result<String> {
        let wallet = EthereumWallet::from(signer_for(&account.private_key)?);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(self.url(chain)?);

        let request = TransactionRequest::default()
            .with_to(parse_address(&tx.to)?)
            .with_input(Bytes::from(tx.data))
            .with_value(U256::from(tx.value));

        let pending = provider
            .send_transaction(request)
            .await
            .map_err(rpc_error)?;
        debug!(chain = %chain, tx_hash = ?pending.tx_hash(), "Transaction sent");

        let receipt = pending.get_receipt().await.map_err(rpc_error)?;
        let tx_hash = format!("{:?}", receipt.transaction_hash());
        if !receipt.status() {
            return Err(ChainError::Reverted { tx_hash }.into());
        }

        info!(chain = %chain, tx_hash = %tx_hash, "Transaction confirmed");
        Ok(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // Hardhat's first default account.
    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn derives_checksummed_address() {
        assert_eq!(
            derive_address(KEY).unwrap(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn rejects_malformed_key() {
        assert!(matches!(
            derive_address("not-a-key"),
            Err(crate::error::Error::Chain(ChainError::InvalidKey(_)))
        ));
    }

    #[test]
    fn converts_base_units() {
        let wei = U256::from(1_500_000_000_000_000_000u128);
        assert_eq!(to_amount(wei, 18).unwrap(), dec!(1.5));
        assert!(to_amount(U256::MAX, 18).is_err());
    }

    #[test]
    fn missing_rpc_is_reported() {
        let client = AlloyChainClient::new([(Chain::Bsc, "https://bsc.example")]).unwrap();
        assert!(client.url(Chain::Bsc).is_ok());
        assert!(matches!(
            client.url(Chain::Celo),
            Err(crate::error::Error::Chain(ChainError::MissingRpc(Chain::Celo)))
        ));
    }

    #[test]
    fn invalid_rpc_url_is_a_config_error() {
        assert!(AlloyChainClient::new([(Chain::Bsc, "not a url")]).is_err());
    }
}
