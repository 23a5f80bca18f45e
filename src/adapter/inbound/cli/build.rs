//! Handler for the `build` command.

use dialoguer::{theme::ColorfulTheme, Confirm};
use serde_json::json;

use crate::adapter::inbound::cli::command::BuildArgs;
use crate::adapter::inbound::cli::{load_config, output};
use crate::error::{ConfigError, Result};
use crate::infrastructure::bootstrap;

/// Build the account database, asking before replacing an existing one.
pub fn execute(args: &BuildArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let path = &config.paths.database;

    if path.exists() && !args.yes {
        if output::is_json() || output::is_quiet() {
            return Err(ConfigError::Other(format!(
                "{} already exists; pass --yes to overwrite it",
                path.display()
            ))
            .into());
        }
        let overwrite = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{} already exists. Overwrite it?", path.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            output::note("Keeping the existing database.");
            return Ok(());
        }
    }

    let store = bootstrap::build_store(&config, &mut rand::thread_rng())?;
    store.persist()?;

    let accounts = store.snapshot();
    let actions: u64 = accounts.iter().map(|a| a.route_quota.total()).sum();

    if output::is_json() {
        output::json_output(json!({
            "command": "build",
            "database": path.display().to_string(),
            "accounts": accounts.len(),
            "actions": actions,
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::section("Account Database");
    output::field("Database", path.display());
    output::field("Accounts", accounts.len());
    output::field("Actions", actions);
    output::success("Database built");
    Ok(())
}
