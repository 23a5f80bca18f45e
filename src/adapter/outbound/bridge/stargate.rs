//! STG token bridge from Polygon to Kava.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use tracing::info;

use super::{add_fee_buffer, to_u128, to_units};
use crate::adapter::outbound::evm::client::parse_address;
use crate::adapter::outbound::evm::contracts::StargateToken;
use crate::application::retry::RetryPolicy;
use crate::domain::{Account, Amount, Route, Token};
use crate::error::{ChainError, Result};
use crate::port::outbound::chain::{ChainClient, TxRequest};
use crate::port::outbound::transfer::TokenBridge;

const ADAPTER_PARAMS_VERSION: u16 = 1;
const DST_GAS: u64 = 85_000;

fn adapter_params() -> Vec<u8> {
    (ADAPTER_PARAMS_VERSION, U256::from(DST_GAS)).abi_encode_packed()
}

/// Sends STG through the token contract's own OFT endpoint.
pub struct StargateBridge {
    chain: Arc<dyn ChainClient>,
    retry: RetryPolicy,
}

impl StargateBridge {
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

    async fn quote_fee(&self, dst: u16, params: &[u8]) -> Result<U256> {
        let token = Token::STG_POLYGON;
        let data = StargateToken::estimateSendTokensFeeCall {
            dstChainId: dst,
            useZro: false,
            txParameters: Bytes::copy_from_slice(params),
        }
        .abi_encode();
        let output = self.chain.call(token.chain, token.address, data).await?;
        let quote = StargateToken::estimateSendTokensFeeCall::abi_decode_returns(&output)
            .map_err(|e| ChainError::Contract(format!("estimateSendTokensFee: {e}")))?;
        Ok(add_fee_buffer(quote.nativeFee))
    }
}

#[async_trait]
impl TokenBridge for StargateBridge {
    fn token(&self) -> Token {
        Token::STG_POLYGON
    }

    async fn bridge(&self, account: &Account, route: &Route, amount: Amount) -> Result<()> {
        let token = self.token();
        if route.source() != token.chain {
            return Err(ChainError::UnsupportedChain {
                provider: "Stargate",
                chain: route.source(),
            }
            .into());
        }

        let dst = route.destination().lz_chain_id();
        let params = adapter_params();
        let fee = self
            .retry
            .run("stargate fee quote", || self.quote_fee(dst, &params))
            .await?;

        let receiver = parse_address(&account.address)?;
        let data = StargateToken::sendTokensCall {
            dstChainId: dst,
            to: Bytes::copy_from_slice(receiver.as_slice()),
            qty: to_units(amount, token.decimals)?,
            zroPaymentAddress: Address::ZERO,
            adapterParam: Bytes::from(params),
        }
        .abi_encode();

        info!(
            address = %account.address,
            from = %route.source(),
            to = %route.destination(),
            amount = %amount,
            symbol = token.symbol,
            "Bridging"
        );

        let tx = TxRequest::new(token.address, data).with_value(to_u128(fee)?);
        self.chain.send_and_confirm(account, token.chain, tx).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Chain;
    use crate::testkit::chain::ScriptedChain;
    use rust_decimal_macros::dec;

    const ADDRESS: &str = "0x3333333333333333333333333333333333333333";

    #[test]
    fn adapter_params_carry_gas_limit() {
        let params = adapter_params();
        assert_eq!(params.len(), 34);
        assert_eq!(&params[..2], &[0, 1]);
        assert_eq!(U256::from_be_slice(&params[2..]), U256::from(85_000u64));
    }

    #[tokio::test]
    async fn sends_tokens_to_kava() {
        let chain = Arc::new(ScriptedChain::new().with_call_results(vec![Ok(
            (U256::from(2000u64), U256::ZERO).abi_encode_params(),
        )]));
        let bridge = StargateBridge::new(chain.clone()).with_retry(RetryPolicy::once());

        bridge
            .bridge(&Account::new("k", ADDRESS), &Route::stargate(), dec!(1.25))
            .await
            .unwrap();

        let sent = chain.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chain, Chain::Polygon);
        assert_eq!(sent[0].tx.to, Token::STG_POLYGON.address);
        assert_eq!(sent[0].tx.value, 2020);
        let call = StargateToken::sendTokensCall::abi_decode(&sent[0].tx.data).unwrap();
        assert_eq!(call.dstChainId, Chain::Kava.lz_chain_id());
        assert_eq!(call.qty, U256::from(1_250_000_000_000_000_000u128));
        assert_eq!(call.zroPaymentAddress, Address::ZERO);
    }

    #[tokio::test]
    async fn failed_quote_sends_nothing() {
        let chain = Arc::new(ScriptedChain::new());
        let bridge = StargateBridge::new(chain.clone()).with_retry(RetryPolicy::once());

        let result = bridge
            .bridge(&Account::new("k", ADDRESS), &Route::stargate(), dec!(1))
            .await;

        assert!(result.is_err());
        assert!(chain.sent().is_empty());
    }
}
