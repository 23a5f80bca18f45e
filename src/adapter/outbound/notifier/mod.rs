//! Notification adapters.
//!
//! Implements the `port::Notifier` trait for the log and Telegram backends.

pub mod log;
#[cfg(feature = "telegram")]
pub mod telegram;

pub use log::LogNotifier;
