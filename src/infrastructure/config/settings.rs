//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file; exchange and swap API credentials
//! come from environment variables only.
//!
//! # Example
//!
//! ```no_run
//! use warmup::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;

use super::execution::ExecutionConfig;
use super::logging::LoggingConfig;
use super::routes::{ChainConfig, RouteConfig};
use super::secrets::Secrets;
use super::telegram::TelegramAppConfig;
use crate::application::funding::FundingRule;
use crate::application::withdrawal::WithdrawalTiming;
use crate::domain::{AmountRange, Chain, CountRange, ProviderKind, ProviderMode, Route};
use crate::error::{ConfigError, Result};

/// Input and state file locations.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_private_keys")]
    pub private_keys: PathBuf,
    #[serde(default = "default_proxies")]
    pub proxies: PathBuf,
    #[serde(default = "default_deposit_addresses")]
    pub deposit_addresses: PathBuf,
    /// The account database.
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

fn default_private_keys() -> PathBuf {
    PathBuf::from("data/private_keys.txt")
}

fn default_proxies() -> PathBuf {
    PathBuf::from("data/proxies.txt")
}

fn default_deposit_addresses() -> PathBuf {
    PathBuf::from("data/deposit_addresses.txt")
}

fn default_database() -> PathBuf {
    PathBuf::from("data/database.json")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            private_keys: default_private_keys(),
            proxies: default_proxies(),
            deposit_addresses: default_deposit_addresses(),
            database: default_database(),
        }
    }
}

/// Proxy settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyConfig {
    /// Use the first proxy for every account and rotate its IP before each
    /// iteration.
    #[serde(default)]
    pub mobile: bool,
    /// URL that rotates the mobile proxy's IP when requested.
    #[serde(default)]
    pub change_ip_url: Option<String>,
}

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    /// RPC endpoint per chain.
    #[serde(default)]
    pub chains: BTreeMap<Chain, ChainConfig>,

    /// The route universe.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    /// Exchange top-up rule per chain.
    #[serde(default)]
    pub funding: BTreeMap<Chain, FundingRule>,

    /// Withdrawal retry budget and polling cadence.
    #[serde(default)]
    pub withdrawal: WithdrawalTiming,

    #[serde(default)]
    pub telegram: TelegramAppConfig,

    /// Loaded from the environment at parse time.
    #[serde(skip)]
    pub secrets: Secrets,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// Reads credentials from the environment, then validates.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation
    /// fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.secrets = Secrets::from_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Resolved routes with their quota and amount ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unresolvable entry.
    #[allow(clippy::result_large_err)]
    pub fn route_plan(&self) -> Result<Vec<(Route, CountRange, AmountRange)>> {
        self.routes
            .iter()
            .map(|entry| {
                let route = entry.route().map_err(|e| ConfigError::InvalidValue {
                    field: "routes",
                    reason: e.to_string(),
                })?;
                Ok((route, entry.tx_range, entry.amount_range))
            })
            .collect()
    }

    /// Quota range per route, as the account database builder wants it.
    ///
    /// # Errors
    ///
    /// See [`Config::route_plan`].
    #[allow(clippy::result_large_err)]
    pub fn quota_ranges(&self) -> Result<Vec<(Route, CountRange)>> {
        Ok(self
            .route_plan()?
            .into_iter()
            .map(|(route, tx, _)| (route, tx))
            .collect())
    }

    /// Amount range per route, as the warmup loop wants it.
    ///
    /// # Errors
    ///
    /// See [`Config::route_plan`].
    #[allow(clippy::result_large_err)]
    pub fn amount_ranges(&self) -> Result<HashMap<Route, AmountRange>> {
        Ok(self
            .route_plan()?
            .into_iter()
            .map(|(route, _, amount)| (route, amount))
            .collect())
    }

    /// RPC URL for `chain`, if configured.
    #[must_use]
    pub fn rpc_url(&self, chain: Chain) -> Option<&str> {
        self.chains
            .get(&chain)
            .map(|c| c.rpc.as_str())
            .filter(|url| !url.is_empty())
    }

    /// Whether any exchange top-up is switched on.
    #[must_use]
    pub fn funding_enabled(&self) -> bool {
        self.funding.values().any(|rule| rule.enabled)
    }

    /// Validate configuration values.
    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        let plan = self.route_plan()?;
        if plan.is_empty() {
            return Err(ConfigError::MissingField { field: "routes" }.into());
        }

        let mut seen = HashSet::new();
        for (route, tx, amount) in &plan {
            if !seen.insert(*route) {
                return Err(ConfigError::InvalidValue {
                    field: "routes",
                    reason: format!("{route} is configured twice"),
                }
                .into());
            }
            tx.validate().map_err(|e| ConfigError::InvalidValue {
                field: "tx_range",
                reason: format!("{route}: {e}"),
            })?;
            amount.validate().map_err(|e| ConfigError::InvalidValue {
                field: "amount_range",
                reason: format!("{route}: {e}"),
            })?;
            if tx.high > 0 && !amount.has_nonzero_value(self.execution.round_to) {
                return Err(ConfigError::InvalidValue {
                    field: "amount_range",
                    reason: format!(
                        "{route}: no nonzero amount at {} decimal places",
                        self.execution.round_to
                    ),
                }
                .into());
            }
            if self.rpc_url(route.source()).is_none() {
                return Err(ConfigError::InvalidValue {
                    field: "chains",
                    reason: format!("no RPC URL for {}, the source of {route}", route.source()),
                }
                .into());
            }
        }

        let uses_swaps = plan
            .iter()
            .any(|(route, _, _)| route.provider().mode() == ProviderMode::SwapThenBridge);
        if uses_swaps && self.secrets.zerox_api_key.is_none() {
            return Err(ConfigError::MissingField {
                field: "ZEROX_API_KEY",
            }
            .into());
        }
        if uses_swaps {
            for kind in [ProviderKind::Stargate, ProviderKind::CoreBridge] {
                let used = plan.iter().any(|(route, _, _)| route.provider() == kind);
                if let Some((from, _)) = kind.fixed_pair().filter(|_| used) {
                    if self.rpc_url(from).is_none() {
                        return Err(ConfigError::InvalidValue {
                            field: "chains",
                            reason: format!("no RPC URL for {from}, needed by {kind}"),
                        }
                        .into());
                    }
                }
            }
        }

        let execution = &self.execution;
        if execution.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "workers",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if execution.token_use_percentage <= Decimal::ZERO
            || execution.token_use_percentage > Decimal::ONE
        {
            return Err(ConfigError::InvalidValue {
                field: "token_use_percentage",
                reason: "must be in (0, 1]".to_string(),
            }
            .into());
        }
        if execution.max_slippage <= Decimal::ZERO || execution.max_slippage > Decimal::ONE_HUNDRED
        {
            return Err(ConfigError::InvalidValue {
                field: "max_slippage",
                reason: "must be a percentage in (0, 100]".to_string(),
            }
            .into());
        }
        if execution.round_to > 18 {
            return Err(ConfigError::InvalidValue {
                field: "round_to",
                reason: "must be at most 18".to_string(),
            }
            .into());
        }
        for (field, range) in [
            ("tx_delay", execution.tx_delay),
            ("after_approve_delay", execution.after_approve_delay),
        ] {
            range.validate().map_err(|e| ConfigError::InvalidValue {
                field,
                reason: e.to_string(),
            })?;
        }

        for (chain, rule) in &self.funding {
            if !rule.enabled {
                continue;
            }
            rule.amount.validate().map_err(|e| ConfigError::InvalidValue {
                field: "funding",
                reason: format!("{chain}: {e}"),
            })?;
            if !rule.amount.has_nonzero_value(execution.round_to) {
                return Err(ConfigError::InvalidValue {
                    field: "funding",
                    reason: format!("{chain}: amount range has no nonzero value"),
                }
                .into());
            }
            if self.rpc_url(*chain).is_none() {
                return Err(ConfigError::InvalidValue {
                    field: "funding",
                    reason: format!("{chain}: no RPC URL to watch the balance"),
                }
                .into());
            }
        }
        if self.funding_enabled() && self.secrets.okx.is_none() {
            return Err(ConfigError::MissingField {
                field: "OKX_API_KEY",
            }
            .into());
        }

        if self.proxy.mobile
            && self
                .proxy
                .change_ip_url
                .as_deref()
                .map_or(true, |url| url.trim().is_empty())
        {
            return Err(ConfigError::MissingField {
                field: "change_ip_url",
            }
            .into());
        }

        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [chains.BSC]
        rpc = "https://bsc.example"

        [[routes]]
        provider = "merkly"
        from = "BSC"
        to = "Gnosis"
        tx_range = [1, 3]
        amount_range = [0.0001, 0.0002]
    "#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::parse_toml(MINIMAL).unwrap();
        assert_eq!(config.execution.round_to, 5);
        assert_eq!(config.execution.workers, 1);
        assert_eq!(config.paths.database, PathBuf::from("data/database.json"));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.withdrawal.retry_count, 5);
        assert_eq!(config.rpc_url(Chain::Bsc), Some("https://bsc.example"));
        assert_eq!(config.rpc_url(Chain::Gnosis), None);
    }

    #[test]
    fn route_plan_resolves_entries() {
        let config = Config::parse_toml(MINIMAL).unwrap();
        let quotas = config.quota_ranges().unwrap();
        assert_eq!(quotas.len(), 1);
        assert_eq!(quotas[0].0.to_string(), "Merkly:BSC-Gnosis");
        assert_eq!(quotas[0].1, CountRange::new(1, 3));
    }

    #[test]
    fn missing_source_rpc_is_rejected() {
        let toml = MINIMAL.replace("[chains.BSC]", "[chains.Celo]");
        let err = Config::parse_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("RPC"));
    }

    #[test]
    fn empty_route_list_is_rejected() {
        let err = Config::parse_toml("").unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Config(ConfigError::MissingField { field: "routes" })
        ));
    }

    #[test]
    fn duplicate_routes_are_rejected() {
        let toml = format!(
            "{MINIMAL}\n[[routes]]\nprovider = \"merkly\"\nfrom = \"BSC\"\nto = \"Gnosis\"\ntx_range = [1, 1]\namount_range = [0.1, 0.1]\n"
        );
        assert!(Config::parse_toml(&toml).is_err());
    }

    #[test]
    fn undrawable_amount_is_rejected() {
        let toml = MINIMAL.replace("[0.0001, 0.0002]", "[0.000001, 0.000002]");
        let err = Config::parse_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("amount_range"));
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let toml = MINIMAL.replace("[1, 3]", "[3, 1]");
        assert!(Config::parse_toml(&toml).is_err());
    }

    #[test]
    fn mobile_proxy_requires_change_ip_url() {
        let toml = format!("[proxy]\nmobile = true\n{MINIMAL}");
        let err = Config::parse_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("change_ip_url"));

        let toml = format!(
            "[proxy]\nmobile = true\nchange_ip_url = \"https://proxy.example/rotate\"\n{MINIMAL}"
        );
        assert!(Config::parse_toml(&toml).is_ok());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let toml = format!("[execution]\nworkers = 0\n{MINIMAL}");
        assert!(Config::parse_toml(&toml).is_err());
    }
}
