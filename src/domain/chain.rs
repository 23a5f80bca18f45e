//! Supported EVM chains and their static metadata.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// An EVM chain the warmup can touch.
///
/// Serialized by its display name (`"BSC"`, `"Polygon"`, ...), which is also
/// the key used in configuration tables and route identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Chain {
    Ethereum,
    Bsc,
    Polygon,
    Arbitrum,
    Moonbeam,
    Moonriver,
    Dfk,
    Harmony,
    Celo,
    Kava,
    Gnosis,
    Core,
    Linea,
    Base,
    Scroll,
    Zora,
    Conflux,
}

impl Chain {
    /// Every known chain, in declaration order.
    pub const ALL: [Chain; 17] = [
        Chain::Ethereum,
        Chain::Bsc,
        Chain::Polygon,
        Chain::Arbitrum,
        Chain::Moonbeam,
        Chain::Moonriver,
        Chain::Dfk,
        Chain::Harmony,
        Chain::Celo,
        Chain::Kava,
        Chain::Gnosis,
        Chain::Core,
        Chain::Linea,
        Chain::Base,
        Chain::Scroll,
        Chain::Zora,
        Chain::Conflux,
    ];

    /// Display name, also used as the serialized form.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ethereum => "Ethereum",
            Self::Bsc => "BSC",
            Self::Polygon => "Polygon",
            Self::Arbitrum => "Arbitrum",
            Self::Moonbeam => "Moonbeam",
            Self::Moonriver => "Moonriver",
            Self::Dfk => "DFK",
            Self::Harmony => "Harmony",
            Self::Celo => "Celo",
            Self::Kava => "Kava",
            Self::Gnosis => "Gnosis",
            Self::Core => "Core",
            Self::Linea => "Linea",
            Self::Base => "Base",
            Self::Scroll => "Scroll",
            Self::Zora => "Zora",
            Self::Conflux => "Conflux",
        }
    }

    /// EIP-155 chain id.
    #[must_use]
    pub const fn chain_id(self) -> u64 {
        match self {
            Self::Ethereum => 1,
            Self::Bsc => 56,
            Self::Polygon => 137,
            Self::Arbitrum => 42161,
            Self::Moonbeam => 1284,
            Self::Moonriver => 1285,
            Self::Dfk => 53935,
            Self::Harmony => 1_666_600_000,
            Self::Celo => 42220,
            Self::Kava => 2222,
            Self::Gnosis => 100,
            Self::Core => 1116,
            Self::Linea => 59144,
            Self::Base => 8453,
            Self::Scroll => 534_352,
            Self::Zora => 7_777_777,
            Self::Conflux => 1030,
        }
    }

    /// LayerZero v1 endpoint id.
    #[must_use]
    pub const fn lz_chain_id(self) -> u16 {
        match self {
            Self::Ethereum => 101,
            Self::Bsc => 102,
            Self::Polygon => 109,
            Self::Arbitrum => 110,
            Self::Moonbeam => 126,
            Self::Moonriver => 167,
            Self::Dfk => 115,
            Self::Harmony => 116,
            Self::Celo => 125,
            Self::Kava => 177,
            Self::Gnosis => 145,
            Self::Core => 153,
            Self::Linea => 183,
            Self::Base => 184,
            Self::Scroll => 214,
            Self::Zora => 195,
            Self::Conflux => 212,
        }
    }

    /// Native coin symbol.
    #[must_use]
    pub const fn native_symbol(self) -> &'static str {
        match self {
            Self::Ethereum
            | Self::Arbitrum
            | Self::Linea
            | Self::Base
            | Self::Scroll
            | Self::Zora => "ETH",
            Self::Bsc => "BNB",
            Self::Polygon => "MATIC",
            Self::Moonbeam => "GLMR",
            Self::Moonriver => "MOVR",
            Self::Dfk => "JEWEL",
            Self::Harmony => "ONE",
            Self::Celo => "CELO",
            Self::Kava => "KAVA",
            Self::Gnosis => "XDAI",
            Self::Core => "CORE",
            Self::Conflux => "CFX",
        }
    }

    /// Network label the exchange expects in withdrawal chain names.
    #[must_use]
    pub const fn exchange_network(self) -> &'static str {
        match self {
            Self::Celo => "CELO",
            Self::Ethereum => "ERC20",
            other => other.name(),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Chain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|chain| chain.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::UnknownChain {
                name: s.to_string(),
            })
    }
}

impl TryFrom<String> for Chain {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Chain> for String {
    fn from(chain: Chain) -> Self {
        chain.name().to_string()
    }
}
