//! The warmup loop.
//!
//! Each iteration leases one account, picks a route with quota left, runs
//! the funding gate and the route executor, then settles the quota in the
//! store. Per-account failures are logged and the loop moves on; only
//! account database errors end the run.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::executor::RouteExecutor;
use super::funding::FundingGate;
use super::selector::ActionSelector;
use super::store::{AccountStore, Settlement};
use crate::domain::{Account, AmountRange, DelayRange, Route};
use crate::error::{Error, Result};
use crate::port::outbound::network::IpRotator;
use crate::port::outbound::notifier::{ActionEvent, Event, NotifierRegistry, SummaryEvent};

/// Loop tuning.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    /// Amount range per route.
    pub amounts: HashMap<Route, AmountRange>,
    /// Decimal places drawn amounts are rounded to.
    pub round_to: u32,
    /// Pause after every executed action.
    pub tx_delay: DelayRange,
    /// Pause when every remaining account is leased by another worker.
    pub idle_wait: Duration,
    /// Concurrent workers.
    pub workers: usize,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            amounts: HashMap::new(),
            round_to: 5,
            tx_delay: DelayRange::none(),
            idle_wait: Duration::from_secs(1),
            workers: 1,
        }
    }
}

/// Result of one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The store is empty.
    Done,
    /// Every remaining account is leased by another worker.
    Busy,
    /// The account had no work left and was removed without executing.
    Retired { address: String },
    /// A route was executed.
    Executed {
        route: Route,
        success: bool,
        settlement: Option<Settlement>,
    },
    /// Nothing was executed this iteration.
    Skipped { address: String, reason: String },
}

#[derive(Debug, Default)]
struct RunStats {
    succeeded: AtomicU64,
    failed: AtomicU64,
    retired: AtomicU64,
}

impl RunStats {
    fn summary(&self) -> SummaryEvent {
        SummaryEvent {
            actions_succeeded: self.succeeded.load(Ordering::Relaxed),
            actions_failed: self.failed.load(Ordering::Relaxed),
            accounts_retired: self.retired.load(Ordering::Relaxed),
        }
    }
}

/// Exclusive claim on an account for the duration of one iteration.
struct Lease<'a> {
    leases: &'a Mutex<HashSet<String>>,
    key: String,
    account: Account,
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.leases.lock().remove(&self.key);
    }
}

/// Drives every account in the store until all quotas are exhausted.
pub struct WarmupLoop {
    store: Arc<AccountStore>,
    selector: ActionSelector,
    gate: FundingGate,
    executor: RouteExecutor,
    settings: LoopSettings,
    rotator: Option<Arc<dyn IpRotator>>,
    notifier: Arc<NotifierRegistry>,
    rng: Mutex<StdRng>,
    leases: Mutex<HashSet<String>>,
    stats: RunStats,
}

impl WarmupLoop {
    #[must_use]
    pub fn new(
        store: Arc<AccountStore>,
        selector: ActionSelector,
        gate: FundingGate,
        settings: LoopSettings,
    ) -> Self {
        Self {
            store,
            selector,
            gate,
            executor: RouteExecutor::new(),
            settings,
            rotator: None,
            notifier: Arc::new(NotifierRegistry::new()),
            rng: Mutex::new(StdRng::from_entropy()),
            leases: Mutex::new(HashSet::new()),
            stats: RunStats::default(),
        }
    }

    #[must_use]
    pub fn with_rotator(mut self, rotator: Arc<dyn IpRotator>) -> Self {
        self.rotator = Some(rotator);
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<NotifierRegistry>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<AccountStore> {
        &self.store
    }

    /// Totals so far.
    #[must_use]
    pub fn summary(&self) -> SummaryEvent {
        self.stats.summary()
    }

    /// Run workers until the store is empty.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error a worker hits; the other workers are
    /// aborted. Everything persisted up to that point stays on disk.
    pub async fn run(self: Arc<Self>) -> Result<SummaryEvent> {
        let workers = self.settings.workers.max(1);
        self.notifier.notify_all(Event::RunStarted {
            accounts: self.store.len(),
            workers,
        });

        let mut set = JoinSet::new();
        for worker in 0..workers {
            let this = Arc::clone(&self);
            set.spawn(async move { this.work(worker).await });
        }

        while let Some(joined) = set.join_next().await {
            let result = joined
                .map_err(|e| Error::Io(std::io::Error::other(format!("worker panicked: {e}"))))
                .and_then(|r| r);
            if let Err(e) = result {
                set.abort_all();
                self.notifier.notify_all(Event::RunAborted {
                    reason: e.to_string(),
                });
                return Err(e);
            }
        }

        let summary = self.summary();
        self.notifier.notify_all(Event::RunFinished(summary.clone()));
        Ok(summary)
    }

    async fn work(&self, worker: usize) -> Result<()> {
        loop {
            match self.step().await {
                Ok(Step::Done) => {
                    debug!(worker, "No accounts left");
                    return Ok(());
                }
                Ok(Step::Busy) => tokio::time::sleep(self.settings.idle_wait).await,
                Ok(Step::Executed { .. }) => self.pause().await,
                Ok(Step::Retired { .. }) => {}
                Ok(Step::Skipped { .. }) => tokio::time::sleep(self.settings.idle_wait).await,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => error!(worker, error = %e, "Iteration failed"),
            }
        }
    }

    async fn pause(&self) {
        let delay = self.settings.tx_delay.sample(&mut *self.rng.lock());
        if !delay.is_zero() {
            debug!(secs = delay.as_secs(), "Sleeping before next action");
            tokio::time::sleep(delay).await;
        }
    }

    /// Run one iteration: select, fund, execute, settle.
    ///
    /// # Errors
    ///
    /// Only account database failures are returned; every other failure
    /// is folded into the returned [`Step`].
    pub async fn step(&self) -> Result<Step> {
        if let Some(rotator) = &self.rotator {
            if let Err(e) = rotator.rotate().await {
                warn!(error = %e, "Proxy IP rotation failed");
            }
        }

        let Some(lease) = self.lease() else {
            return Ok(if self.store.is_empty() {
                Step::Done
            } else {
                Step::Busy
            });
        };
        let account = &lease.account;

        let selection = self.selector.select(account, &mut *self.rng.lock());
        let Some(selection) = selection else {
            if self.store.remove_if_exhausted(account)? {
                self.retire(account);
                return Ok(Step::Retired {
                    address: account.address.clone(),
                });
            }
            warn!(
                address = %account.address,
                remaining = account.route_quota.total(),
                "Account has quota but no servable route"
            );
            return Ok(Step::Skipped {
                address: account.address.clone(),
                reason: "no servable route".into(),
            });
        };
        let route = selection.route;

        let Some(amount) = self.draw_amount(&route) else {
            warn!(address = %account.address, route = %route, "No amount to draw for route");
            return Ok(Step::Skipped {
                address: account.address.clone(),
                reason: format!("no amount to draw for {route}"),
            });
        };

        info!(
            address = %account.short_address(),
            route = %route,
            amount = %amount,
            remaining = account.route_quota.total(),
            "Starting action"
        );

        let funding = self.gate.ensure_funded(account, route.source()).await;
        debug!(address = %account.address, funding = ?funding, "Funding checked");

        let success = self
            .executor
            .execute(selection.provider.as_ref(), &route, amount, account)
            .await;

        self.notifier
            .notify_all(Event::ActionCompleted(ActionEvent {
                address: account.address.clone(),
                route,
                amount,
                success,
            }));

        if !success {
            self.stats.failed.fetch_add(1, Ordering::Relaxed);
            return Ok(Step::Executed {
                route,
                success,
                settlement: None,
            });
        }
        self.stats.succeeded.fetch_add(1, Ordering::Relaxed);

        let settlement = self.store.settle(account, &route)?;
        match settlement {
            Settlement::Retired => self.retire(account),
            Settlement::Decremented { remaining } => {
                debug!(address = %account.address, remaining, "Quota decremented");
            }
            Settlement::Underflow => {
                warn!(address = %account.address, route = %route, "Quota already zero after success");
            }
            Settlement::Missing => {
                warn!(address = %account.address, "Account vanished before settlement");
            }
        }

        Ok(Step::Executed {
            route,
            success,
            settlement: Some(settlement),
        })
    }

    fn lease(&self) -> Option<Lease<'_>> {
        let mut leases = self.leases.lock();
        let (account, _) = self.store.random_matching(
            |account| !leases.contains(&account.address.to_lowercase()),
            &mut *self.rng.lock(),
        )?;
        let key = account.address.to_lowercase();
        leases.insert(key.clone());
        Some(Lease {
            leases: &self.leases,
            key,
            account,
        })
    }

    fn draw_amount(&self, route: &Route) -> Option<Decimal> {
        let range = self.settings.amounts.get(route)?;
        range
            .sample(&mut *self.rng.lock(), self.settings.round_to)
            .filter(|amount| *amount > Decimal::ZERO)
    }

    fn retire(&self, account: &Account) {
        self.stats.retired.fetch_add(1, Ordering::Relaxed);
        self.notifier.notify_all(Event::AccountRetired {
            address: account.address.clone(),
        });
    }
}
