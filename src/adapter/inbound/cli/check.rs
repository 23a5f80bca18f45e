//! Handler for the `check` command.

use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::{load_config, output};
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Summary of a validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigCheckReport {
    pub routes: Vec<String>,
    pub chains: Vec<String>,
    pub funding_chains: Vec<String>,
    pub exchange_credentials: bool,
    pub swap_api_key: bool,
    pub telegram_enabled: bool,
    pub mobile_proxy: bool,
    pub workers: usize,
}

impl ConfigCheckReport {
    #[allow(clippy::result_large_err)]
    fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            routes: config
                .route_plan()?
                .iter()
                .map(|(route, tx, _)| format!("{route} [{}..{}]", tx.low, tx.high))
                .collect(),
            chains: config
                .chains
                .keys()
                .filter(|chain| config.rpc_url(**chain).is_some())
                .map(ToString::to_string)
                .collect(),
            funding_chains: config
                .funding
                .iter()
                .filter(|(_, rule)| rule.enabled)
                .map(|(chain, _)| chain.to_string())
                .collect(),
            exchange_credentials: config.secrets.okx.is_some(),
            swap_api_key: config.secrets.zerox_api_key.is_some(),
            telegram_enabled: config.telegram.enabled,
            mobile_proxy: config.proxy.mobile,
            workers: config.execution.workers,
        })
    }
}

/// Validate the configuration file without running anything.
pub fn execute(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let report = ConfigCheckReport::from_config(&config)?;
    let database = config.paths.database.exists();

    if output::is_json() {
        output::json_output(json!({
            "command": "check",
            "valid": true,
            "routes": report.routes,
            "chains": report.chains,
            "funding": report.funding_chains,
            "exchange_credentials": report.exchange_credentials,
            "swap_api_key": report.swap_api_key,
            "telegram": report.telegram_enabled,
            "mobile_proxy": report.mobile_proxy,
            "workers": report.workers,
            "database": database,
        }));
        return Ok(());
    }

    output::section("Configuration Check");
    output::field("Config", config_path.display());
    output::success("Configuration file is valid");

    output::section("Summary");
    output::field("Routes", report.routes.join(", "));
    output::field("Chains", report.chains.join(", "));
    output::field("Workers", report.workers);
    if report.funding_chains.is_empty() {
        output::field("Funding", "disabled");
    } else {
        output::field("Funding", report.funding_chains.join(", "));
    }
    output::field("0x API key", if report.swap_api_key { "set" } else { "-" });
    output::field("Mobile proxy", report.mobile_proxy);
    output::field("Telegram", report.telegram_enabled);
    if database {
        output::field("Database", config.paths.database.display());
    } else {
        output::warning("Account database not built yet (run `warmup build`)");
    }

    output::success("Configuration check complete");
    Ok(())
}
