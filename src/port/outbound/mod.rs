//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the engine's external collaborators: chain RPC,
//! the funding exchange, transfer providers, proxy rotation and
//! notifications.

pub mod chain;
pub mod exchange;
pub mod network;
pub mod notifier;
pub mod transfer;
