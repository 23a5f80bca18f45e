//! Bounded retry with a fixed pause between attempts.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::Result;

/// How often and how patiently a transient read is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Pause between attempts, in seconds.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

const fn default_attempts() -> u32 {
    3
}

const fn default_delay_secs() -> u64 {
    5
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            delay_secs: default_delay_secs(),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no pause.
    #[must_use]
    pub const fn once() -> Self {
        Self {
            attempts: 1,
            delay_secs: 0,
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    /// Run `op` until it succeeds or the attempts are used up, returning the
    /// last error.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= attempts => return Err(e),
                Err(e) => {
                    warn!(what, attempt, attempts, error = %e, "Attempt failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(self.delay()).await;
                }
            }
        }
    }
}
