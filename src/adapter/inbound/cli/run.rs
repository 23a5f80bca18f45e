//! Handler for the `run` command.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::output;
use crate::error::{ConfigError, Result};
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::notifier::SummaryEvent;

/// Run the warmup loop until every account is finished or Ctrl+C.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    config.logging = config
        .logging
        .clone()
        .with_overrides(args.log_level.as_deref(), args.json_logs);
    if let Some(workers) = args.workers {
        if workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "workers",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        config.execution.workers = workers;
    }
    config.logging.init();

    let store = Arc::new(bootstrap::load_store(&config)?);
    if store.is_empty() {
        output::success("Every account has finished its warmup");
        return Ok(());
    }

    if !output::is_json() {
        output::header(env!("CARGO_PKG_VERSION"));
        output::field("Accounts", store.len());
        output::field("Workers", config.execution.workers);
        output::field("Database", config.paths.database.display());
        println!();
    }

    let warmup = Arc::new(bootstrap::build_warmup(&config, Arc::clone(&store))?);

    tokio::select! {
        result = Arc::clone(&warmup).run() => {
            let summary = result?;
            print_summary(&summary, store.len());
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            output::warning("Interrupted; progress up to the last settled action is saved");
            print_summary(&warmup.summary(), store.len());
        }
    }

    Ok(())
}

fn print_summary(summary: &SummaryEvent, remaining: usize) {
    if output::is_json() {
        output::json_output(json!({
            "command": "run",
            "actions_succeeded": summary.actions_succeeded,
            "actions_failed": summary.actions_failed,
            "accounts_retired": summary.accounts_retired,
            "accounts_remaining": remaining,
        }));
        return;
    }

    output::section("Summary");
    output::field("Succeeded", summary.actions_succeeded);
    output::field("Failed", summary.actions_failed);
    output::field("Finished", summary.accounts_retired);
    output::field("Remaining", remaining);
}
