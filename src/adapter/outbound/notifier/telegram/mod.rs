//! Telegram notifications.
//!
//! Events are queued to a background worker that sends them to every
//! configured chat.

mod format;

pub mod notifier;

pub use notifier::{TelegramConfig, TelegramNotifier};
