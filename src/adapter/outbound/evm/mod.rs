//! EVM access: the alloy chain client, contract bindings and ERC-20 helpers.

pub mod client;
pub mod contracts;
pub(crate) mod erc20;

pub use client::{derive_address, AlloyChainClient};
