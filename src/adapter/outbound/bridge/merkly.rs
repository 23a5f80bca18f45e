//! Merkly gas refuel: send native coin to another chain over LayerZero.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use tracing::{info, warn};

use super::{add_fee_buffer, to_u128, to_units};
use crate::adapter::outbound::evm::client::parse_address;
use crate::adapter::outbound::evm::contracts::MerklyRefuel;
use crate::application::retry::RetryPolicy;
use crate::domain::{from_base_units, Account, Amount, Asset, Chain, ProviderKind, Route};
use crate::error::{ChainError, Result};
use crate::port::outbound::chain::{ChainClient, TxRequest};
use crate::port::outbound::transfer::TransferProvider;

/// LayerZero adapter params version carrying an airdrop.
const ADAPTER_PARAMS_VERSION: u16 = 2;
/// Destination gas limit.
const DST_GAS: u64 = 250_000;

/// Refuel contract on `chain`, if Merkly is deployed there.
#[must_use]
pub const fn refuel_contract(chain: Chain) -> Option<&'static str> {
    match chain {
        Chain::Bsc => Some("0xeF1eAE0457e8D56A003d781569489Bc5466E574b"),
        Chain::Polygon => Some("0x0E1f20075C90Ab31FC2Dd91E536e6990262CF76d"),
        Chain::Celo => Some("0xC20A842e1Fc2681920C1A190552A2f13C46e7fCF"),
        Chain::Gnosis => Some("0x556F119C7433b2232294FB3De267747745A1dAb4"),
        Chain::Arbitrum => Some("0x4Ae8CEBcCD7027820ba83188DFD73CCAD0A92806"),
        Chain::Moonbeam => Some("0x671861008497782F7108D908D4dF18eBf9598b82"),
        Chain::Moonriver => Some("0xd379c3D0930d70022B3C6EBA8217e4B990705540"),
        Chain::Conflux => Some("0xE47b05F2026a82048caAECf5caE58e5AAE2405eA"),
        _ => None,
    }
}

fn adapter_params(airdrop: U256, receiver: Address) -> Vec<u8> {
    (ADAPTER_PARAMS_VERSION, U256::from(DST_GAS), airdrop, receiver).abi_encode_packed()
}

/// Direct refuel provider.
pub struct MerklyProvider {
    chain: Arc<dyn ChainClient>,
    retry: RetryPolicy,
}

impl MerklyProvider {
    #[must_use]
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self {
            chain,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn quote_fee(&self, source: Chain, contract: &str, dst: u16, params: &[u8]) -> Result<U256> {
        let data = MerklyRefuel::estimateSendFeeCall {
            dstChainId: dst,
            toAddress: Bytes::new(),
            adapterParams: Bytes::copy_from_slice(params),
        }
        .abi_encode();
        let output = self.chain.call(source, contract, data).await?;
        let quote = MerklyRefuel::estimateSendFeeCall::abi_decode_returns(&output)
            .map_err(|e| ChainError::Contract(format!("estimateSendFee: {e}")))?;
        Ok(add_fee_buffer(quote.nativeFee))
    }
}

#[async_trait]
impl TransferProvider for MerklyProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Merkly
    }

    async fn transfer(&self, account: &Account, route: &Route, amount: Amount) -> Result<()> {
        let source = route.source();
        let destination = route.destination();
        let contract = refuel_contract(source).ok_or(ChainError::UnsupportedChain {
            provider: self.name(),
            chain: source,
        })?;

        let receiver = parse_address(&account.address)?;
        let params = adapter_params(to_units(amount, Asset::NATIVE_DECIMALS)?, receiver);
        let dst = destination.lz_chain_id();

        let fee = self
            .retry
            .run("merkly fee quote", || {
                self.quote_fee(source, contract, dst, &params)
            })
            .await?;

        let balance = self.chain.native_balance(account, source).await?;
        let balance_units = to_units(balance, Asset::NATIVE_DECIMALS)?;
        if balance_units < fee {
            let needed = from_base_units(to_u128(fee)?, Asset::NATIVE_DECIMALS).unwrap_or(balance);
            return Err(ChainError::InsufficientFunds {
                needed,
                available: balance,
            }
            .into());
        }

        info!(
            address = %account.address,
            from = %source,
            to = %destination,
            amount = %amount,
            symbol = destination.native_symbol(),
            "Refuelling"
        );

        let data = MerklyRefuel::bridgeGasCall {
            dstChainId: dst,
            toAddress: Bytes::copy_from_slice(receiver.as_slice()),
            adapterParams: Bytes::from(params),
        }
        .abi_encode();
        let tx = TxRequest::new(contract, data).with_value(to_u128(fee)?);

        self.chain
            .send_and_confirm(account, source, tx)
            .await
            .map(|_| ())
            .inspect_err(|e| {
                if e.to_string().contains("dstNativeAmt too large") {
                    warn!(route = %route, amount = %amount, "Refuel amount exceeds the route's maximum");
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::chain::ScriptedChain;
    use rust_decimal_macros::dec;

    const ADDRESS: &str = "0x3333333333333333333333333333333333333333";

    fn fee_quote(native: u64) -> Vec<u8> {
        (U256::from(native), U256::ZERO).abi_encode_params()
    }

    fn provider(chain: Arc<ScriptedChain>) -> MerklyProvider {
        MerklyProvider::new(chain).with_retry(RetryPolicy::once())
    }

    #[test]
    fn adapter_params_are_packed() {
        let receiver = Address::repeat_byte(0xab);
        let params = adapter_params(U256::from(7u64), receiver);
        assert_eq!(params.len(), 2 + 32 + 32 + 20);
        assert_eq!(&params[..2], &[0, 2]);
        assert_eq!(params[2 + 31], 0x90);
        assert_eq!(params[2 + 63], 7);
        assert_eq!(&params[66..], receiver.as_slice());
    }

    #[tokio::test]
    async fn refuels_with_buffered_fee() {
        let chain = Arc::new(
            ScriptedChain::new()
                .with_call_results(vec![Ok(fee_quote(1000))])
                .with_native_balances(vec![dec!(1)]),
        );
        let route = Route::refuel(Chain::Bsc, Chain::Celo).unwrap();

        provider(chain.clone())
            .transfer(&Account::new("k", ADDRESS), &route, dec!(0.001))
            .await
            .unwrap();

        let sent = chain.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chain, Chain::Bsc);
        assert_eq!(sent[0].tx.value, 1010);
        assert_eq!(sent[0].tx.to, refuel_contract(Chain::Bsc).unwrap());
        let call = MerklyRefuel::bridgeGasCall::abi_decode(&sent[0].tx.data).unwrap();
        assert_eq!(call.dstChainId, Chain::Celo.lz_chain_id());
        assert_eq!(call.toAddress.as_ref(), parse_address(ADDRESS).unwrap().as_slice());
    }

    #[tokio::test]
    async fn refuses_when_balance_is_below_fee() {
        let chain = Arc::new(
            ScriptedChain::new()
                .with_call_results(vec![Ok(fee_quote(1000))])
                .with_native_balances(vec![dec!(0)]),
        );
        let route = Route::refuel(Chain::Bsc, Chain::Celo).unwrap();

        let result = provider(chain.clone())
            .transfer(&Account::new("k", ADDRESS), &route, dec!(0.001))
            .await;

        assert!(matches!(
            result,
            Err(crate::error::Error::Chain(ChainError::InsufficientFunds { .. }))
        ));
        assert!(chain.sent().is_empty());
    }

    #[tokio::test]
    async fn unsupported_source_chain_fails_without_rpc() {
        let chain = Arc::new(ScriptedChain::new());
        let route = Route::refuel(Chain::Kava, Chain::Celo).unwrap();

        let result = provider(chain.clone())
            .transfer(&Account::new("k", ADDRESS), &route, dec!(0.001))
            .await;

        assert!(result.is_err());
        assert_eq!(chain.call_count(), 0);
    }
}
