//! Warmup - resumable multi-account cross-chain activity runner.
//!
//! Drives a persisted set of EVM accounts through randomized quotas of
//! LayerZero actions (Merkly gas refuels, Stargate and CoreBridge token
//! bridges behind a 0x swap), topping up gas from an exchange when a
//! balance runs low.
//!
//! # Architecture
//!
//! - [`domain`] - Chains, routes, quotas, ranges and accounts
//! - [`port`] - Traits the engine talks to (chain, exchange, transfer, notifier)
//! - [`application`] - Account database, selection, funding and the warmup loop
//! - [`adapter`] - CLI plus chain, exchange, bridge, swap and notifier integrations
//! - [`infrastructure`] - Configuration and wiring
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `evm` - Alloy-backed chain client, bridges and swaps (default)
//! - `telegram` - Telegram notifications (default)
//! - `testkit` - Scripted adapters for integration tests

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
