//! DEX aggregator swaps.

pub mod zerox;

pub use zerox::ZeroXSwapper;
