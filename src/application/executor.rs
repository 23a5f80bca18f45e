//! Route execution and the swap-then-bridge provider.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info, warn};

use super::retry::RetryPolicy;
use crate::domain::{Account, Amount, Asset, ProviderKind, ProviderMode, Route};
use crate::error::{ChainError, Result};
use crate::port::outbound::chain::ChainClient;
use crate::port::outbound::transfer::{Swapper, TokenBridge, TransferProvider};

/// Share of the token balance bridged when swapping before every bridge.
const FULL_BALANCE_SHARE: Decimal = Decimal::from_parts(999, 0, 0, false, 3);

/// Dispatches a selected route to its provider.
///
/// Never touches quota; the caller settles on success.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteExecutor;

impl RouteExecutor {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Run `route` through `provider`, reporting success as a boolean.
    pub async fn execute(
        &self,
        provider: &dyn TransferProvider,
        route: &Route,
        amount: Amount,
        account: &Account,
    ) -> bool {
        let result = match provider.mode() {
            ProviderMode::Direct => provider.transfer(account, route, amount).await,
            ProviderMode::SwapThenBridge => {
                provider.swap_and_transfer(account, route, amount).await
            }
        };

        match result {
            Ok(()) => {
                info!(
                    address = %account.address,
                    route = %route,
                    amount = %amount,
                    "Route executed"
                );
                true
            }
            Err(e) => {
                warn!(
                    address = %account.address,
                    route = %route,
                    provider = provider.name(),
                    error = %e,
                    "Route failed"
                );
                false
            }
        }
    }
}

/// How much of the intermediate token gets bridged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapPolicy {
    /// Swap before every bridge and send almost the whole balance.
    pub swap_before_bridge: bool,
    /// Share of the balance bridged when not swapping every time.
    pub token_use_percentage: Decimal,
    /// Decimal places the bridged amount is truncated to.
    pub round_to: u32,
}

impl SwapPolicy {
    /// Amount to bridge out of `balance`.
    ///
    /// The share is truncated toward zero at `round_to`, never rounded up.
    #[must_use]
    pub fn bridge_amount(&self, balance: Amount) -> Amount {
        let share = if self.swap_before_bridge {
            FULL_BALANCE_SHARE
        } else {
            self.token_use_percentage
        };
        (balance * share).round_dp_with_strategy(self.round_to, RoundingStrategy::ToZero)
    }
}

/// A provider that buys an intermediate token with native coin, then
/// bridges part of its token balance.
pub struct SwapThenBridge {
    kind: ProviderKind,
    chain: Arc<dyn ChainClient>,
    swapper: Arc<dyn Swapper>,
    bridge: Arc<dyn TokenBridge>,
    policy: SwapPolicy,
    retry: RetryPolicy,
}

impl SwapThenBridge {
    #[must_use]
    pub fn new(
        kind: ProviderKind,
        chain: Arc<dyn ChainClient>,
        swapper: Arc<dyn Swapper>,
        bridge: Arc<dyn TokenBridge>,
        policy: SwapPolicy,
    ) -> Self {
        Self {
            kind,
            chain,
            swapper,
            bridge,
            policy,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn token_balance(&self, account: &Account, asset: &Asset) -> Result<Amount> {
        self.retry
            .run("token balance", || self.chain.balance(account, asset))
            .await
    }
}

#[async_trait]
impl TransferProvider for SwapThenBridge {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn swap_and_transfer(
        &self,
        account: &Account,
        route: &Route,
        amount: Amount,
    ) -> Result<()> {
        let token = self.bridge.token();
        let asset = Asset::Erc20(token);

        let mut balance = self.token_balance(account, &asset).await?;
        if self.policy.swap_before_bridge || balance.is_zero() {
            debug!(
                address = %account.address,
                token = %token,
                amount = %amount,
                "Swapping native into bridge token"
            );
            self.swapper
                .swap(account, &Asset::Native(token.chain), &asset, amount)
                .await?;
            balance = self.token_balance(account, &asset).await?;
        }

        let value = self.policy.bridge_amount(balance);
        if value <= Decimal::ZERO {
            return Err(ChainError::InsufficientFunds {
                needed: Decimal::new(1, self.policy.round_to),
                available: balance,
            }
            .into());
        }

        self.bridge.bridge(account, route, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::chain::ScriptedChain;
    use crate::testkit::transfer::{RecordingBridge, RecordingSwapper, ScriptedProvider};
    use crate::domain::{Chain, Token};
    use rust_decimal_macros::dec;

    fn policy(swap_before_bridge: bool) -> SwapPolicy {
        SwapPolicy {
            swap_before_bridge,
            token_use_percentage: dec!(0.003),
            round_to: 5,
        }
    }

    fn provider(
        chain: ScriptedChain,
        swap_before_bridge: bool,
    ) -> (SwapThenBridge, Arc<RecordingSwapper>, Arc<RecordingBridge>) {
        let swapper = Arc::new(RecordingSwapper::new());
        let bridge = Arc::new(RecordingBridge::new(Token::STG_POLYGON));
        let provider = SwapThenBridge::new(
            ProviderKind::Stargate,
            Arc::new(chain),
            swapper.clone(),
            bridge.clone(),
            policy(swap_before_bridge),
        )
        .with_retry(RetryPolicy::once());
        (provider, swapper, bridge)
    }

    #[test]
    fn bridge_amount_truncates_to_precision() {
        assert_eq!(policy(true).bridge_amount(dec!(10)), dec!(9.99));
        assert_eq!(policy(false).bridge_amount(dec!(123.456789)), dec!(0.37037));
        assert_eq!(policy(false).bridge_amount(dec!(0.001)), dec!(0));
        assert_eq!(policy(true).bridge_amount(dec!(0.000019)), dec!(0.00001));
    }

    #[tokio::test]
    async fn swaps_when_token_balance_is_empty() {
        let chain = ScriptedChain::new().with_token_balances(vec![dec!(0), dec!(100)]);
        let (provider, swapper, bridge) = provider(chain, false);
        let account = Account::new("k", "0xa");

        provider
            .swap_and_transfer(&account, &Route::stargate(), dec!(1.5))
            .await
            .unwrap();

        assert_eq!(swapper.swaps(), vec![dec!(1.5)]);
        assert_eq!(bridge.bridged(), vec![dec!(0.3)]);
    }

    #[tokio::test]
    async fn skips_swap_when_balance_exists_and_policy_is_off() {
        let chain = ScriptedChain::new().with_token_balances(vec![dec!(1000)]);
        let (provider, swapper, bridge) = provider(chain, false);

        provider
            .swap_and_transfer(&Account::new("k", "0xa"), &Route::stargate(), dec!(1))
            .await
            .unwrap();

        assert!(swapper.swaps().is_empty());
        assert_eq!(bridge.bridged(), vec![dec!(3)]);
    }

    #[tokio::test]
    async fn always_swaps_and_bridges_most_of_balance_when_policy_is_on() {
        let chain = ScriptedChain::new().with_token_balances(vec![dec!(5), dec!(20)]);
        let (provider, swapper, bridge) = provider(chain, true);

        provider
            .swap_and_transfer(&Account::new("k", "0xa"), &Route::stargate(), dec!(2))
            .await
            .unwrap();

        assert_eq!(swapper.swaps(), vec![dec!(2)]);
        assert_eq!(bridge.bridged(), vec![dec!(19.98)]);
    }

    #[tokio::test]
    async fn dust_balance_is_an_error() {
        let chain = ScriptedChain::new().with_token_balances(vec![dec!(0.000001)]);
        let (provider, _, bridge) = provider(chain, false);

        let result = provider
            .swap_and_transfer(&Account::new("k", "0xa"), &Route::stargate(), dec!(1))
            .await;

        assert!(result.is_err());
        assert!(bridge.bridged().is_empty());
    }

    #[tokio::test]
    async fn executor_dispatches_on_mode() {
        let executor = RouteExecutor::new();
        let account = Account::new("k", "0xa");
        let route = Route::refuel(Chain::Bsc, Chain::Celo).unwrap();

        let direct = ScriptedProvider::succeeding(ProviderKind::Merkly);
        assert!(executor.execute(&direct, &route, dec!(0.01), &account).await);
        assert_eq!(direct.transfer_calls(), 1);
        assert_eq!(direct.swap_calls(), 0);

        let swapping = ScriptedProvider::succeeding(ProviderKind::Stargate);
        assert!(
            executor
                .execute(&swapping, &Route::stargate(), dec!(1), &account)
                .await
        );
        assert_eq!(swapping.swap_calls(), 1);
        assert_eq!(swapping.transfer_calls(), 0);

        let failing = ScriptedProvider::failing(ProviderKind::Merkly);
        assert!(!executor.execute(&failing, &route, dec!(0.01), &account).await);
    }
}
