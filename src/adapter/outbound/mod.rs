//! Outbound adapters (driven side).

#[cfg(feature = "evm")]
pub mod bridge;
#[cfg(feature = "evm")]
pub mod evm;
pub mod notifier;
pub mod okx;
pub mod proxy;
#[cfg(feature = "evm")]
pub mod swap;
