//! Chain endpoints and the configured route universe.

use serde::Deserialize;

use crate::domain::error::DomainError;
use crate::domain::{AmountRange, Chain, CountRange, ProviderKind, Route};

/// `[chains.<Chain>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainConfig {
    /// HTTP RPC endpoint.
    #[serde(default)]
    pub rpc: String,
}

/// One `[[routes]]` entry.
///
/// `from` and `to` may be omitted for providers pinned to a single chain
/// pair.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    pub provider: ProviderKind,
    #[serde(default)]
    pub from: Option<Chain>,
    #[serde(default)]
    pub to: Option<Chain>,
    /// Range each account's quota for this route is drawn from.
    pub tx_range: CountRange,
    /// Range each action's amount is drawn from, in the source chain's
    /// native coin.
    pub amount_range: AmountRange,
}

impl RouteConfig {
    /// Resolve the configured pair into a [`Route`].
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidRoute`] when a chain is missing for a
    /// refuel route or the pair does not match the provider.
    pub fn route(&self) -> Result<Route, DomainError> {
        let (from, to) = match (self.from, self.to, self.provider.fixed_pair()) {
            (Some(from), Some(to), _) => (from, to),
            (None, None, Some(pair)) => pair,
            (from, to, Some((fixed_from, fixed_to))) => {
                (from.unwrap_or(fixed_from), to.unwrap_or(fixed_to))
            }
            (_, _, None) => {
                return Err(DomainError::InvalidRoute {
                    route: self.provider.name().to_string(),
                    reason: "refuel routes need both `from` and `to`".into(),
                })
            }
        };
        Route::new(self.provider, from, to)
    }
}
