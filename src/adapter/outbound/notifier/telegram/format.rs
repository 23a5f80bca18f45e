//! Message formatting for Telegram notifications.

use crate::port::outbound::notifier::Event;

use super::notifier::TelegramConfig;

/// Format an event into a Telegram message, or None if the event should be skipped.
pub fn format_event_message(event: &Event, config: &TelegramConfig) -> Option<String> {
    match event {
        Event::RunStarted { accounts, workers } => Some(format!(
            "🚀 *Warmup Started*\n\
            \n\
            👛 Accounts: `{accounts}`\n\
            ⚙️ Workers: `{workers}`"
        )),
        Event::ActionCompleted(e) if config.notify_actions => {
            let (emoji, title) = if e.success {
                ("✅", "Action Executed")
            } else {
                ("❌", "Action Failed")
            };

            Some(format!(
                "{} *{}*\n\
                \n\
                👛 `{}`\n\
                🔀 {}\n\
                💵 Amount: `{}`",
                emoji,
                title,
                escape_markdown(&truncate(&e.address, 12)),
                escape_markdown(&e.route.to_string()),
                e.amount
            ))
        }
        Event::AccountRetired { address } if config.notify_retirements => Some(format!(
            "🏁 *Account Finished*\n\
            \n\
            👛 `{}`",
            escape_markdown(address)
        )),
        Event::WithdrawalFinished(e) if config.notify_withdrawals => {
            let (emoji, title) = if e.received {
                ("💸", "Withdrawal Received")
            } else {
                ("⚠️", "Withdrawal Failed")
            };

            Some(format!(
                "{} *{}*\n\
                \n\
                👛 `{}`\n\
                ⛓️ Chain: {}\n\
                💵 Amount: `{}`\n\
                📝 {}",
                emoji,
                title,
                escape_markdown(&truncate(&e.address, 12)),
                escape_markdown(e.chain.name()),
                e.amount,
                escape_markdown(&e.outcome)
            ))
        }
        Event::RunFinished(e) => Some(format!(
            "📊 *Warmup Finished*\n\
            \n\
            ✅ Succeeded: `{}`\n\
            ❌ Failed: `{}`\n\
            🏁 Accounts done: `{}`",
            e.actions_succeeded, e.actions_failed, e.accounts_retired
        )),
        Event::RunAborted { reason } => Some(format!(
            "🛑 *Warmup Aborted*\n\
            \n\
            ⚠️ Reason: {}",
            escape_markdown(reason)
        )),
        _ => None,
    }
}

/// Truncate a string with ellipsis (Unicode-safe).
pub fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

/// Escape special characters for Telegram `MarkdownV2`.
pub fn escape_markdown(text: &str) -> String {
    let special_chars = [
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    ];
    let mut result = String::with_capacity(text.len() * 2);

    for c in text.chars() {
        if special_chars.contains(&c) {
            result.push('\\');
        }
        result.push(c);
    }

    result
}
