//! Route identifiers and the static route → provider table.
//!
//! A route is an ordered (source, destination) chain pair tagged with the
//! provider that serves it. The tag is part of the identity: `Polygon-Kava`
//! refuelled through Merkly and `Polygon-Kava` bridged as STG through
//! Stargate are different routes with independent quotas.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::chain::Chain;
use super::error::DomainError;

/// Transfer provider serving a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Native gas refuel between any chain pair.
    Merkly,
    /// STG bridge from Polygon to Kava, funded by a MATIC → STG swap.
    Stargate,
    /// USDT bridge from BSC to Core, funded by a BNB → USDT swap.
    CoreBridge,
}

/// How the executor drives a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    /// Bridge the drawn amount directly.
    Direct,
    /// Swap native into an intermediate token, then bridge that token.
    SwapThenBridge,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::Merkly, Self::Stargate, Self::CoreBridge];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Merkly => "Merkly",
            Self::Stargate => "Stargate",
            Self::CoreBridge => "CoreBridge",
        }
    }

    #[must_use]
    pub const fn mode(self) -> ProviderMode {
        match self {
            Self::Merkly => ProviderMode::Direct,
            Self::Stargate | Self::CoreBridge => ProviderMode::SwapThenBridge,
        }
    }

    /// The only chain pair a named provider serves, if it is pinned to one.
    #[must_use]
    pub const fn fixed_pair(self) -> Option<(Chain, Chain)> {
        match self {
            Self::Merkly => None,
            Self::Stargate => Some((Chain::Polygon, Chain::Kava)),
            Self::CoreBridge => Some((Chain::Bsc, Chain::Core)),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::InvalidRoute {
                route: s.to_string(),
                reason: "unknown provider".into(),
            })
    }
}

/// A quota slot: provider plus ordered chain pair.
///
/// Serialized as `"<Provider>:<From>-<To>"`, e.g. `"Merkly:BSC-Gnosis"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Route {
    provider: ProviderKind,
    from: Chain,
    to: Chain,
}

impl Route {
    /// Build a route, enforcing the provider's pinned pair if it has one.
    pub fn new(provider: ProviderKind, from: Chain, to: Chain) -> Result<Self, DomainError> {
        if from == to {
            return Err(DomainError::InvalidRoute {
                route: format!("{provider}:{from}-{to}"),
                reason: "source and destination are the same chain".into(),
            });
        }
        if let Some((fixed_from, fixed_to)) = provider.fixed_pair() {
            if (from, to) != (fixed_from, fixed_to) {
                return Err(DomainError::InvalidRoute {
                    route: format!("{provider}:{from}-{to}"),
                    reason: format!("{provider} only serves {fixed_from}-{fixed_to}"),
                });
            }
        }
        Ok(Self { provider, from, to })
    }

    /// Merkly refuel route between two chains.
    pub fn refuel(from: Chain, to: Chain) -> Result<Self, DomainError> {
        Self::new(ProviderKind::Merkly, from, to)
    }

    /// The named Stargate STG route.
    #[must_use]
    pub const fn stargate() -> Self {
        Self {
            provider: ProviderKind::Stargate,
            from: Chain::Polygon,
            to: Chain::Kava,
        }
    }

    /// The named CoreBridge USDT route.
    #[must_use]
    pub const fn core_bridge() -> Self {
        Self {
            provider: ProviderKind::CoreBridge,
            from: Chain::Bsc,
            to: Chain::Core,
        }
    }

    #[must_use]
    pub const fn provider(&self) -> ProviderKind {
        self.provider
    }

    #[must_use]
    pub const fn source(&self) -> Chain {
        self.from
    }

    #[must_use]
    pub const fn destination(&self) -> Chain {
        self.to
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.provider, self.from, self.to)
    }
}

impl FromStr for Route {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| DomainError::InvalidRoute {
            route: s.to_string(),
            reason: reason.to_string(),
        };

        let (provider, pair) = s
            .split_once(':')
            .ok_or_else(|| invalid("expected <provider>:<from>-<to>"))?;
        let (from, to) = pair
            .split_once('-')
            .ok_or_else(|| invalid("expected <from>-<to> chain pair"))?;

        Self::new(provider.parse()?, from.parse()?, to.parse()?)
    }
}

impl TryFrom<String> for Route {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Route> for String {
    fn from(route: Route) -> Self {
        route.to_string()
    }
}
