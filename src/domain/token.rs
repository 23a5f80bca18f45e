//! Assets that balances are read in and swaps are priced in.

use std::fmt;

use rust_decimal::Decimal;

use super::chain::Chain;
use super::range::Amount;

/// An ERC-20 token deployed on a specific chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub chain: Chain,
    pub symbol: &'static str,
    pub address: &'static str,
    pub decimals: u32,
}

impl Token {
    /// Stargate STG on Polygon.
    pub const STG_POLYGON: Token = Token {
        chain: Chain::Polygon,
        symbol: "STG",
        address: "0x2F6F07CDcf3588944Bf4C42aC74ff24bF56e7590",
        decimals: 18,
    };

    /// Binance-peg USDT on BSC.
    pub const USDT_BSC: Token = Token {
        chain: Chain::Bsc,
        symbol: "USDT",
        address: "0x55d398326f99059fF775485246999027B3197955",
        decimals: 18,
    };
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.symbol, self.chain)
    }
}

/// Either a chain's native coin or one of its tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Asset {
    Native(Chain),
    Erc20(Token),
}

impl Asset {
    /// Decimals used by every EVM native coin.
    pub const NATIVE_DECIMALS: u32 = 18;

    #[must_use]
    pub const fn chain(&self) -> Chain {
        match self {
            Self::Native(chain) => *chain,
            Self::Erc20(token) => token.chain,
        }
    }

    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Native(chain) => chain.native_symbol(),
            Self::Erc20(token) => token.symbol,
        }
    }

    #[must_use]
    pub const fn decimals(&self) -> u32 {
        match self {
            Self::Native(_) => Self::NATIVE_DECIMALS,
            Self::Erc20(token) => token.decimals,
        }
    }

    #[must_use]
    pub const fn is_native(&self) -> bool {
        matches!(self, Self::Native(_))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(chain) => write!(f, "{} on {}", chain.native_symbol(), chain),
            Self::Erc20(token) => token.fmt(f),
        }
    }
}

/// Convert a whole-unit amount to integer base units, truncating dust.
///
/// Returns `None` for negative amounts or values that do not fit.
#[must_use]
pub fn to_base_units(amount: Amount, decimals: u32) -> Option<u128> {
    if amount.is_sign_negative() {
        return None;
    }
    let mut scaled = amount.trunc_with_scale(decimals);
    scaled.rescale(decimals);
    if scaled.scale() != decimals {
        return None;
    }
    u128::try_from(scaled.mantissa()).ok()
}

/// Convert integer base units back to a whole-unit amount.
#[must_use]
pub fn from_base_units(units: u128, decimals: u32) -> Option<Amount> {
    let units = i128::try_from(units).ok()?;
    Decimal::try_from_i128_with_scale(units, decimals).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn base_units_round_trip_at_eighteen_decimals() {
        let units = to_base_units(dec!(1.5), 18).unwrap();
        assert_eq!(units, 1_500_000_000_000_000_000);
        assert_eq!(from_base_units(units, 18).unwrap(), dec!(1.5));
    }

    #[test]
    fn base_units_truncate_dust() {
        assert_eq!(to_base_units(dec!(0.1234567), 6), Some(123_456));
        assert_eq!(to_base_units(dec!(-1), 6), None);
    }

    #[test]
    fn native_asset_metadata() {
        let asset = Asset::Native(Chain::Polygon);
        assert_eq!(asset.symbol(), "MATIC");
        assert_eq!(asset.decimals(), 18);
        assert!(asset.is_native());
        assert_eq!(Asset::Erc20(Token::USDT_BSC).chain(), Chain::Bsc);
    }
}
