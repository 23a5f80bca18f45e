//! Telegram notification configuration.

use serde::Deserialize;

const fn default_true() -> bool {
    true
}

/// Telegram notification configuration.
///
/// The bot token and chat ids come from the environment; this section only
/// switches the notifier on and picks which events are sent.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramAppConfig {
    /// Enable telegram notifications.
    #[serde(default)]
    pub enabled: bool,
    /// Send a message for every executed action (can be noisy).
    #[serde(default)]
    pub notify_actions: bool,
    /// Send exchange withdrawal results.
    #[serde(default = "default_true")]
    pub notify_withdrawals: bool,
    /// Send a message when an account finishes its warmup.
    #[serde(default = "default_true")]
    pub notify_retirements: bool,
}

impl Default for TelegramAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            notify_actions: false,
            notify_withdrawals: default_true(),
            notify_retirements: default_true(),
        }
    }
}
