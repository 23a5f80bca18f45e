//! Telegram notifier.
//!
//! Provides the [`TelegramNotifier`] for sending warmup progress to one or
//! more chats. Spawns a background worker for outbound messages.
//!
//! Requires the `telegram` feature to be enabled.

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::infrastructure::config::telegram::TelegramAppConfig;
use crate::port::{outbound::notifier::Event, outbound::notifier::Notifier};

use super::format::format_event_message;

/// Configuration for the Telegram notifier.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot API token obtained from BotFather.
    pub bot_token: String,
    /// Chats every notification goes to.
    pub chat_ids: Vec<i64>,
    /// Send a message for every executed action.
    pub notify_actions: bool,
    /// Send exchange withdrawal results.
    pub notify_withdrawals: bool,
    /// Send account retirements.
    pub notify_retirements: bool,
}

impl TelegramConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads `TELEGRAM_BOT_TOKEN` and the comma-separated
    /// `TELEGRAM_CHAT_IDS`. Returns `None` if either is missing or any chat
    /// id is not a number.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())?;
        let chat_ids = std::env::var("TELEGRAM_CHAT_IDS")
            .ok()
            .and_then(|s| parse_chat_ids(&s))?;

        Some(Self {
            bot_token,
            chat_ids,
            notify_actions: false,
            notify_withdrawals: true,
            notify_retirements: true,
        })
    }

    /// Apply the `[telegram]` event switches.
    #[must_use]
    pub fn with_switches(mut self, app: &TelegramAppConfig) -> Self {
        self.notify_actions = app.notify_actions;
        self.notify_withdrawals = app.notify_withdrawals;
        self.notify_retirements = app.notify_retirements;
        self
    }
}

fn parse_chat_ids(raw: &str) -> Option<Vec<i64>> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<Vec<i64>, _>>()
        .ok()?;
    (!ids.is_empty()).then_some(ids)
}

/// Telegram notifier that sends messages to every configured chat.
pub struct TelegramNotifier {
    /// Channel sender for queuing outbound notifications.
    sender: mpsc::UnboundedSender<Event>,
}

impl TelegramNotifier {
    /// Create a new Telegram notifier and spawn the background worker.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(config: TelegramConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(telegram_worker(config, receiver));
        Self { sender }
    }
}

impl Notifier for TelegramNotifier {
    fn notify(&self, event: Event) {
        if self.sender.send(event).is_err() {
            warn!("Telegram notifier channel closed");
        }
    }
}

/// Background worker that sends Telegram messages.
async fn telegram_worker(config: TelegramConfig, mut receiver: mpsc::UnboundedReceiver<Event>) {
    let bot = Bot::new(&config.bot_token);

    info!(chats = config.chat_ids.len(), "Telegram notifier started");

    while let Some(event) = receiver.recv().await {
        let Some(text) = format_event_message(&event, &config) else {
            continue;
        };
        for &chat_id in &config.chat_ids {
            if let Err(e) = bot
                .send_message(ChatId(chat_id), &text)
                .parse_mode(ParseMode::MarkdownV2)
                .await
            {
                error!(chat_id, error = %e, "Failed to send Telegram message");
            }
        }
    }

    warn!("Telegram notifier worker shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that modify environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_from_env_missing_token() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("TELEGRAM_BOT_TOKEN");
        std::env::remove_var("TELEGRAM_CHAT_IDS");

        assert!(TelegramConfig::from_env().is_none());
    }

    #[test]
    fn test_from_env_missing_chat_ids() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("TELEGRAM_BOT_TOKEN", "test-token");
        std::env::remove_var("TELEGRAM_CHAT_IDS");

        assert!(TelegramConfig::from_env().is_none());

        std::env::remove_var("TELEGRAM_BOT_TOKEN");
    }

    #[test]
    fn test_from_env_invalid_chat_id() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("TELEGRAM_BOT_TOKEN", "test-token");
        std::env::set_var("TELEGRAM_CHAT_IDS", "123,not-a-number");

        assert!(TelegramConfig::from_env().is_none());

        std::env::remove_var("TELEGRAM_BOT_TOKEN");
        std::env::remove_var("TELEGRAM_CHAT_IDS");
    }

    #[test]
    fn test_from_env_valid() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("TELEGRAM_BOT_TOKEN", "test-token");
        std::env::set_var("TELEGRAM_CHAT_IDS", "12345, -100987 ,");

        let config = TelegramConfig::from_env().unwrap();
        assert_eq!(config.bot_token, "test-token");
        assert_eq!(config.chat_ids, vec![12345, -100_987]);
        assert!(!config.notify_actions);
        assert!(config.notify_withdrawals);

        std::env::remove_var("TELEGRAM_BOT_TOKEN");
        std::env::remove_var("TELEGRAM_CHAT_IDS");
    }

    #[test]
    fn test_switches_override_defaults() {
        let config = TelegramConfig {
            bot_token: "t".into(),
            chat_ids: vec![1],
            notify_actions: false,
            notify_withdrawals: true,
            notify_retirements: true,
        }
        .with_switches(&TelegramAppConfig {
            enabled: true,
            notify_actions: true,
            notify_withdrawals: false,
            notify_retirements: true,
        });
        assert!(config.notify_actions);
        assert!(!config.notify_withdrawals);
    }
}
