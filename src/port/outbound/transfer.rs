//! Transfer provider ports: direct bridges and the legs of swap-then-bridge.

use async_trait::async_trait;

use crate::domain::{Account, Amount, Asset, ProviderKind, ProviderMode, Route, Token};
use crate::error::{ChainError, Result};

/// A provider that moves value along a [`Route`].
///
/// `mode()` tells the executor which entry point to call. Entry points a
/// provider does not implement fail with
/// [`ChainError::UnsupportedOperation`].
#[async_trait]
pub trait TransferProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn mode(&self) -> ProviderMode {
        self.kind().mode()
    }

    /// Bridge `amount` of native coin from the route's source to its
    /// destination.
    async fn transfer(&self, _account: &Account, _route: &Route, _amount: Amount) -> Result<()> {
        Err(ChainError::UnsupportedOperation {
            provider: self.name(),
            operation: "direct transfer",
        }
        .into())
    }

    /// Swap `amount` of native coin into the provider's intermediate token,
    /// then bridge a share of the token balance.
    async fn swap_and_transfer(
        &self,
        _account: &Account,
        _route: &Route,
        _amount: Amount,
    ) -> Result<()> {
        Err(ChainError::UnsupportedOperation {
            provider: self.name(),
            operation: "swap and transfer",
        }
        .into())
    }
}

/// The bridge leg of a swap-then-bridge provider.
#[async_trait]
pub trait TokenBridge: Send + Sync {
    /// Token this bridge moves.
    fn token(&self) -> Token;

    /// Bridge `amount` of [`token`](Self::token) along `route`.
    async fn bridge(&self, account: &Account, route: &Route, amount: Amount) -> Result<()>;
}

/// The swap leg of a swap-then-bridge provider.
#[async_trait]
pub trait Swapper: Send + Sync {
    /// Sell `amount` of `sell` for `buy` on the assets' shared chain.
    async fn swap(&self, account: &Account, sell: &Asset, buy: &Asset, amount: Amount)
        -> Result<()>;
}
