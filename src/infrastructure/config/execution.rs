//! Execution pacing and amount precision.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::retry::RetryPolicy;
use crate::domain::DelayRange;

/// `[execution]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Decimal places drawn and bridged amounts are rounded to.
    #[serde(default = "default_round_to")]
    pub round_to: u32,
    /// Swap into the intermediate token before every token bridge.
    #[serde(default)]
    pub swap_before_bridge: bool,
    /// Share of the intermediate token balance bridged per action when not
    /// swapping every time.
    #[serde(default = "default_token_use_percentage")]
    pub token_use_percentage: Decimal,
    /// Swap slippage tolerance, in percent.
    #[serde(default = "default_max_slippage")]
    pub max_slippage: Decimal,
    /// Pause after every executed action, in seconds.
    #[serde(default = "default_tx_delay")]
    pub tx_delay: DelayRange,
    /// Pause after every approval transaction, in seconds.
    #[serde(default = "default_after_approve_delay")]
    pub after_approve_delay: DelayRange,
    /// Concurrent loop workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Pause when every remaining account is busy, in seconds.
    #[serde(default = "default_idle_wait_secs")]
    pub idle_wait_secs: u64,
    /// Retry budget for balance reads and quote requests.
    #[serde(default)]
    pub retry: RetryPolicy,
}

const fn default_round_to() -> u32 {
    5
}

fn default_token_use_percentage() -> Decimal {
    Decimal::new(3, 3)
}

fn default_max_slippage() -> Decimal {
    Decimal::ONE
}

const fn default_tx_delay() -> DelayRange {
    DelayRange::new(30, 100)
}

const fn default_after_approve_delay() -> DelayRange {
    DelayRange::new(5, 10)
}

const fn default_workers() -> usize {
    1
}

const fn default_idle_wait_secs() -> u64 {
    5
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            round_to: default_round_to(),
            swap_before_bridge: false,
            token_use_percentage: default_token_use_percentage(),
            max_slippage: default_max_slippage(),
            tx_delay: default_tx_delay(),
            after_approve_delay: default_after_approve_delay(),
            workers: default_workers(),
            idle_wait_secs: default_idle_wait_secs(),
            retry: RetryPolicy::default(),
        }
    }
}
