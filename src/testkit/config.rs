//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::application::warmup::LoopSettings;
use crate::application::withdrawal::WithdrawalTiming;
use crate::domain::{AmountRange, DelayRange, Route};

/// One Merkly route from BSC with a local RPC; parses without secrets.
pub const MINIMAL_TOML: &str = r#"
[chains.BSC]
rpc = "http://127.0.0.1:8545"

[[routes]]
provider = "merkly"
from = "BSC"
to = "Gnosis"
tx_range = [1, 3]
amount_range = [0.0001, 0.0002]
"#;

/// [`MINIMAL_TOML`] with every `[paths]` entry under `dir`.
pub fn toml_in(dir: &Path) -> String {
    format!(
        "[paths]\n\
         private_keys = {:?}\n\
         proxies = {:?}\n\
         deposit_addresses = {:?}\n\
         database = {:?}\n\
         {MINIMAL_TOML}",
        dir.join("private_keys.txt"),
        dir.join("proxies.txt"),
        dir.join("deposit_addresses.txt"),
        dir.join("database.json"),
    )
}

/// Withdrawal timing with small budgets and no pauses.
pub fn withdrawal_timing() -> WithdrawalTiming {
    WithdrawalTiming {
        retry_count: 2,
        status_poll_attempts: 5,
        receipt_poll_attempts: 5,
        ..WithdrawalTiming::default()
    }
    .without_pauses()
}

/// Single-worker loop settings with no pauses.
pub fn loop_settings(amounts: &[(Route, AmountRange)]) -> LoopSettings {
    LoopSettings {
        amounts: amounts.iter().copied().collect::<HashMap<_, _>>(),
        round_to: 5,
        tx_delay: DelayRange::none(),
        idle_wait: Duration::ZERO,
        workers: 1,
    }
}
