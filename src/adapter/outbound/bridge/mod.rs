//! LayerZero bridge adapters.
//!
//! Each adapter encodes its contract calls with alloy's sol types and does
//! every read and write through the [`ChainClient`] port.
//!
//! [`ChainClient`]: crate::port::outbound::chain::ChainClient

pub mod core_bridge;
pub mod merkly;
pub mod stargate;

pub use core_bridge::CoreBridge;
pub use merkly::MerklyProvider;
pub use stargate::StargateBridge;

use alloy_primitives::U256;

use crate::domain::{to_base_units, Amount};
use crate::error::{ChainError, Result};

/// Quoted fee plus one percent headroom.
pub(crate) fn add_fee_buffer(fee: U256) -> U256 {
    fee * U256::from(101u64) / U256::from(100u64)
}

pub(crate) fn to_units(amount: Amount, decimals: u32) -> Result<U256> {
    to_base_units(amount, decimals)
        .map(U256::from)
        .ok_or_else(|| ChainError::Contract(format!("amount {amount} out of range")).into())
}

pub(crate) fn to_u128(value: U256) -> Result<u128> {
    u128::try_from(value).map_err(|_| ChainError::Contract(format!("value {value} out of range")).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn fee_buffer_adds_one_percent() {
        assert_eq!(add_fee_buffer(U256::from(1000u64)), U256::from(1010u64));
        assert_eq!(add_fee_buffer(U256::from(99u64)), U256::from(99u64));
    }

    #[test]
    fn negative_amount_has_no_units() {
        assert!(to_units(dec!(-1), 18).is_err());
        assert_eq!(to_units(dec!(1.5), 6).unwrap(), U256::from(1_500_000u64));
    }
}
