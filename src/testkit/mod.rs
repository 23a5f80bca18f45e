//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`chain`]: `ScriptedChain`, a [`ChainClient`](crate::port::outbound::chain::ChainClient)
//!   with queued balances and recorded transactions.
//! - [`exchange`]: `ScriptedExchange`, queued submission results and statuses.
//! - [`transfer`]: Scripted providers, swappers and bridges.
//! - [`notifier`]: Recording notifier and counting IP rotator.
//! - [`domain`]: Builders for accounts and routes.
//! - [`config`]: Canonical test configurations.

pub mod chain;
pub mod config;
pub mod domain;
pub mod exchange;
pub mod notifier;
pub mod transfer;
