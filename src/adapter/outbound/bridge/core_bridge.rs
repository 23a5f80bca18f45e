//! USDT bridge from BSC to Core.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use tracing::info;

use super::{to_u128, to_units};
use crate::adapter::outbound::evm::client::parse_address;
use crate::adapter::outbound::evm::contracts::CoreBridge as CoreBridgeContract;
use crate::adapter::outbound::evm::erc20;
use crate::application::retry::RetryPolicy;
use crate::domain::{Account, Amount, DelayRange, Route, Token};
use crate::error::{ChainError, Result};
use crate::port::outbound::chain::{ChainClient, TxRequest};
use crate::port::outbound::transfer::TokenBridge;

/// Core's LayerZero bridge on BSC.
pub const CORE_BRIDGE_CONTRACT: &str = "0x52e75D318cFB31f9A2EdFa2DFee26B161255B233";

/// Approves USDT to the Core bridge and sends it across.
pub struct CoreBridge {
    chain: Arc<dyn ChainClient>,
    approve_pause: DelayRange,
    retry: RetryPolicy,
}

impl CoreBridge {
    #[must_use]
    pub fn new(chain: Arc<dyn ChainClient>, approve_pause: DelayRange) -> Self {
        Self {
            chain,
            approve_pause,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn quote_fee(&self) -> Result<U256> {
        let data = CoreBridgeContract::estimateBridgeFeeCall {
            useZro: true,
            adapterParams: Bytes::new(),
        }
        .abi_encode();
        let output = self
            .chain
            .call(self.token().chain, CORE_BRIDGE_CONTRACT, data)
            .await?;
        let quote = CoreBridgeContract::estimateBridgeFeeCall::abi_decode_returns(&output)
            .map_err(|e| ChainError::Contract(format!("estimateBridgeFee: {e}")))?;
        Ok(quote.nativeFee)
    }
}

#[async_trait]
impl TokenBridge for CoreBridge {
    fn token(&self) -> Token {
        Token::USDT_BSC
    }

    async fn bridge(&self, account: &Account, route: &Route, amount: Amount) -> Result<()> {
        let token = self.token();
        if route.source() != token.chain {
            return Err(ChainError::UnsupportedChain {
                provider: "CoreBridge",
                chain: route.source(),
            }
            .into());
        }

        let value = to_units(amount, token.decimals)?;
        let token_address = parse_address(token.address)?;
        let bridge_address = parse_address(CORE_BRIDGE_CONTRACT)?;
        erc20::ensure_allowance(
            self.chain.as_ref(),
            account,
            token.chain,
            token_address,
            bridge_address,
            value,
            self.approve_pause,
        )
        .await?;

        let fee = self.retry.run("core bridge fee quote", || self.quote_fee()).await?;

        let owner = parse_address(&account.address)?;
        let data = CoreBridgeContract::bridgeCall {
            token: token_address,
            amountLD: value,
            to: owner,
            callParams: CoreBridgeContract::LzCallParams {
                refundAddress: owner,
                zroPaymentAddress: Address::ZERO,
            },
            adapterParams: Bytes::new(),
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

        let tx = TxRequest::new(CORE_BRIDGE_CONTRACT, data).with_value(to_u128(fee)?);
        self.chain.send_and_confirm(account, token.chain, tx).await?;
        Ok(())
    }
}
