//! Handler for the `reset` command.

use serde_json::json;

use crate::adapter::inbound::cli::command::ResetArgs;
use crate::adapter::inbound::cli::{load_config, output};
use crate::error::{ConfigError, Result};
use crate::infrastructure::bootstrap;

/// Reset the progress flags of the account at `args.index`.
pub fn execute(args: &ResetArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let store = bootstrap::load_store(&config)?;

    let Some(account) = store.get(args.index) else {
        return Err(ConfigError::InvalidValue {
            field: "index",
            reason: format!("no account at index {} ({} in database)", args.index, store.len()),
        }
        .into());
    };
    store.reset_flags(args.index)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "reset",
            "index": args.index,
            "address": account.address,
        }));
        return Ok(());
    }

    output::success(&format!(
        "Reset progress flags of #{} ({})",
        args.index,
        account.short_address()
    ));
    Ok(())
}
