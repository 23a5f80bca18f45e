//! Composition root: builds adapters, the account database and the warmup
//! loop from a loaded [`Config`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};

#[cfg(feature = "telegram")]
use crate::adapter::outbound::notifier::telegram::{TelegramConfig, TelegramNotifier};
use crate::adapter::outbound::notifier::LogNotifier;
use crate::application::selector::ProviderTable;
use crate::application::store::{AccountSeeds, AccountStore};
use crate::application::warmup::{LoopSettings, WarmupLoop};
use crate::domain::{Account, AmountRange, Route};
use crate::error::{ConfigError, Error, Result};
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::notifier::NotifierRegistry;

/// Non-empty, trimmed lines of `path`.
///
/// A missing optional file reads as empty; a missing required one is a
/// configuration error.
#[allow(clippy::result_large_err)]
pub fn read_lines(path: &Path, required: bool) -> Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToOwned::to_owned)
            .collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => Ok(Vec::new()),
        Err(e) => Err(ConfigError::InvalidValue {
            field: "paths",
            reason: format!("{}: {e}", path.display()),
        }
        .into()),
    }
}

/// Key, proxy and deposit-address lists named by `[paths]`.
#[allow(clippy::result_large_err)]
pub fn read_seeds(config: &Config) -> Result<AccountSeeds> {
    let seeds = AccountSeeds {
        keys: read_lines(&config.paths.private_keys, true)?,
        proxies: read_lines(&config.paths.proxies, false)?,
        deposit_addresses: read_lines(&config.paths.deposit_addresses, false)?,
        mobile_proxy: config.proxy.mobile,
    };
    if seeds.keys.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "paths",
            reason: format!("{} has no keys", config.paths.private_keys.display()),
        }
        .into());
    }
    info!(
        keys = seeds.keys.len(),
        proxies = seeds.proxies.len(),
        deposit_addresses = seeds.deposit_addresses.len(),
        "Read account inputs"
    );
    Ok(seeds)
}

/// Build a fresh account database from the configured input files.
///
/// Nothing is written; call [`AccountStore::persist`] on the result.
pub fn build_store<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Result<AccountStore> {
    let seeds = read_seeds(config)?;
    let quotas = config.quota_ranges()?;
    AccountStore::build(&config.paths.database, seeds, &quotas, derive_address, rng)
}

#[cfg(feature = "evm")]
fn derive_address(private_key: &str) -> Result<String> {
    crate::adapter::outbound::evm::derive_address(private_key)
}

#[cfg(not(feature = "evm"))]
fn derive_address(_private_key: &str) -> Result<String> {
    Err(ConfigError::Other("built without the `evm` feature".into()).into())
}

/// Every route an account still has work on must be configured and served.
#[allow(clippy::result_large_err)]
pub fn check_coverage(
    accounts: &[Account],
    providers: &ProviderTable,
    amounts: &HashMap<Route, AmountRange>,
    round_to: u32,
) -> Result<()> {
    for account in accounts {
        for (route, _) in account.route_quota.active() {
            let Some(amount) = amounts.get(&route) else {
                return Err(ConfigError::InvalidValue {
                    field: "routes",
                    reason: format!(
                        "{route} has work left for {} but is not configured",
                        account.short_address()
                    ),
                }
                .into());
            };
            if !amount.has_nonzero_value(round_to) {
                return Err(ConfigError::InvalidValue {
                    field: "routes",
                    reason: format!(
                        "{route} has work left for {} but amount_range has no nonzero value at {round_to} decimals",
                        account.short_address()
                    ),
                }
                .into());
            }
            if !providers.serves(&route) {
                return Err(ConfigError::InvalidValue {
                    field: "routes",
                    reason: format!("no provider available for {route}"),
                }
                .into());
            }
        }
    }
    Ok(())
}

/// Build notifier registry from configuration.
#[cfg(feature = "telegram")]
pub(crate) fn build_notifier_registry(config: &Config) -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));

    if config.telegram.enabled {
        if let Some(tg_config) = TelegramConfig::from_env() {
            let tg_config = tg_config.with_switches(&config.telegram);
            registry.register(Box::new(TelegramNotifier::new(tg_config)));
            info!("Telegram notifier enabled");
        } else {
            warn!("Telegram enabled but TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_IDS not set");
        }
    }

    registry
}

/// Build notifier registry from configuration (non-telegram variant).
#[cfg(not(feature = "telegram"))]
pub(crate) fn build_notifier_registry(config: &Config) -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));
    if config.telegram.enabled {
        warn!("Telegram enabled in config but the `telegram` feature is not compiled in");
    }
    registry
}

#[cfg(feature = "evm")]
fn loop_settings(config: &Config) -> Result<LoopSettings> {
    Ok(LoopSettings {
        amounts: config.amount_ranges()?,
        round_to: config.execution.round_to,
        tx_delay: config.execution.tx_delay,
        idle_wait: std::time::Duration::from_secs(config.execution.idle_wait_secs),
        workers: config.execution.workers,
    })
}

/// Wire the warmup loop over an already-loaded account database.
///
/// # Errors
///
/// Returns a [`ConfigError`] if an account has work on a route the
/// configuration cannot serve, or an adapter cannot be built.
#[cfg(feature = "evm")]
pub fn build_warmup(config: &Config, store: Arc<AccountStore>) -> Result<WarmupLoop> {
    use crate::adapter::outbound::bridge::{merkly, CoreBridge, MerklyProvider, StargateBridge};
    use crate::adapter::outbound::evm::AlloyChainClient;
    use crate::adapter::outbound::okx::{withdrawal_fee, OkxClient};
    use crate::adapter::outbound::proxy::HttpIpRotator;
    use crate::adapter::outbound::swap::ZeroXSwapper;
    use crate::application::executor::{SwapPolicy, SwapThenBridge};
    use crate::application::funding::FundingGate;
    use crate::application::selector::ActionSelector;
    use crate::application::withdrawal::WithdrawalMonitor;
    use crate::domain::{ProviderKind, ProviderMode};
    use crate::port::outbound::chain::ChainClient;
    use crate::port::outbound::exchange::ExchangeClient;
    use crate::port::outbound::transfer::{Swapper, TokenBridge};

    let execution = &config.execution;
    let settings = loop_settings(config)?;
    let plan = config.route_plan()?;

    for (route, _, _) in &plan {
        if route.provider() == ProviderKind::Merkly
            && merkly::refuel_contract(route.source()).is_none()
        {
            return Err(ConfigError::InvalidValue {
                field: "routes",
                reason: format!("Merkly has no refuel contract on {}", route.source()),
            }
            .into());
        }
    }

    let chain: Arc<dyn ChainClient> = Arc::new(AlloyChainClient::new(
        config
            .chains
            .iter()
            .filter(|(_, c)| !c.rpc.is_empty())
            .map(|(chain, c)| (*chain, c.rpc.as_str())),
    )?);

    let mut providers = ProviderTable::new().with(Arc::new(
        MerklyProvider::new(Arc::clone(&chain)).with_retry(execution.retry),
    ));

    let swap_kinds: Vec<ProviderKind> = plan
        .iter()
        .map(|(route, _, _)| route.provider())
        .filter(|kind| kind.mode() == ProviderMode::SwapThenBridge)
        .collect();
    if let Some(api_key) = config.secrets.zerox_api_key.as_deref() {
        let swapper: Arc<dyn Swapper> = Arc::new(ZeroXSwapper::new(
            Arc::clone(&chain),
            api_key,
            execution.max_slippage,
            execution.after_approve_delay,
        ));
        let policy = SwapPolicy {
            swap_before_bridge: execution.swap_before_bridge,
            token_use_percentage: execution.token_use_percentage,
            round_to: execution.round_to,
        };
        for kind in [ProviderKind::Stargate, ProviderKind::CoreBridge] {
            if !swap_kinds.contains(&kind) {
                continue;
            }
            let bridge: Arc<dyn TokenBridge> = match kind {
                ProviderKind::Stargate => {
                    Arc::new(StargateBridge::new(Arc::clone(&chain)).with_retry(execution.retry))
                }
                _ => Arc::new(
                    CoreBridge::new(Arc::clone(&chain), execution.after_approve_delay)
                        .with_retry(execution.retry),
                ),
            };
            providers = providers.with(Arc::new(
                SwapThenBridge::new(kind, Arc::clone(&chain), Arc::clone(&swapper), bridge, policy)
                    .with_retry(execution.retry),
            ));
        }
    }

    check_coverage(
        &store.snapshot(),
        &providers,
        &settings.amounts,
        settings.round_to,
    )?;

    let notifier = Arc::new(build_notifier_registry(config));

    let monitor = match (&config.secrets.okx, config.funding_enabled()) {
        (Some(credentials), true) => {
            let exchange: Arc<dyn ExchangeClient> = Arc::new(OkxClient::new(credentials.clone()));
            Some(WithdrawalMonitor::new(exchange, Arc::clone(&chain), config.withdrawal))
        }
        _ => None,
    };
    let rules = config
        .funding
        .iter()
        .map(|(chain, rule)| {
            let mut rule = *rule;
            rule.fee = withdrawal_fee(*chain, rule.fee);
            (*chain, rule)
        })
        .collect();
    let gate = FundingGate::new(Arc::clone(&chain), monitor, rules, execution.round_to)
        .with_retry(execution.retry)
        .with_notifier(Arc::clone(&notifier));

    let mut warmup = WarmupLoop::new(store, ActionSelector::new(providers), gate, settings)
        .with_notifier(notifier);

    if config.proxy.mobile {
        let url = config
            .proxy
            .change_ip_url
            .as_deref()
            .ok_or(ConfigError::MissingField {
                field: "change_ip_url",
            })?;
        warmup = warmup.with_rotator(Arc::new(HttpIpRotator::new(url)?));
        info!("Mobile proxy rotation enabled");
    }

    Ok(warmup)
}

/// Wire the warmup loop (built without on-chain support).
#[cfg(not(feature = "evm"))]
pub fn build_warmup(_config: &Config, _store: Arc<AccountStore>) -> Result<WarmupLoop> {
    Err(Error::Config(ConfigError::Other(
        "on-chain execution requires the `evm` feature".into(),
    )))
}

/// Load the account database, mapping a missing file to a hint.
pub fn load_store(config: &Config) -> Result<AccountStore> {
    let path = &config.paths.database;
    if !path.exists() {
        return Err(Error::Config(ConfigError::Other(format!(
            "account database {} not found, run `warmup build` first",
            path.display()
        ))));
    }
    AccountStore::load(path)
}
