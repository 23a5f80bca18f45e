//! Account records and their per-route quota tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::chain::Chain;
use super::error::DomainError;
use super::route::Route;

/// Remaining executions per route.
///
/// A route with quota 0 stays in the table but is inactive. Keys are
/// serialized with their `Provider:From-To` identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuotaTable(BTreeMap<Route, u32>);

impl QuotaTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining count for `route`, or `None` if the route is not tracked.
    #[must_use]
    pub fn get(&self, route: &Route) -> Option<u32> {
        self.0.get(route).copied()
    }

    pub fn set(&mut self, route: Route, remaining: u32) {
        self.0.insert(route, remaining);
    }

    /// Decrement `route` by one and return the new count.
    ///
    /// Fails without modifying the table when the quota is already zero or
    /// the route is not tracked.
    pub fn decrement(&mut self, route: &Route) -> Result<u32, DomainError> {
        let slot = self
            .0
            .get_mut(route)
            .ok_or(DomainError::UntrackedRoute { route: *route })?;
        if *slot == 0 {
            return Err(DomainError::QuotaUnderflow { route: *route });
        }
        *slot -= 1;
        Ok(*slot)
    }

    /// Total outstanding work across every route.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.values().map(|&n| u64::from(n)).sum()
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.0.values().all(|&n| n == 0)
    }

    /// Routes that still have work left.
    pub fn active(&self) -> impl Iterator<Item = (Route, u32)> + '_ {
        self.0
            .iter()
            .filter(|(_, &n)| n > 0)
            .map(|(route, &n)| (*route, n))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Route, u32)> + '_ {
        self.0.iter().map(|(route, &n)| (*route, n))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Route, u32)> for QuotaTable {
    fn from_iter<I: IntoIterator<Item = (Route, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One-shot milestones of the funding/cross-swap lifecycle.
///
/// The warmup loop never reads or writes these; they are persisted as-is
/// and can be reset from the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressFlags {
    pub chain_with_funds: Option<Chain>,
    pub warmup_started: bool,
    pub warmup_finished: bool,
    pub okx_withdrawn: bool,
    pub polygon_from_usdc_swapped: bool,
    pub from_polygon_ageur_bridged: bool,
    pub to_polygon_ageur_bridged: bool,
    pub polygon_to_usdc_swapped: bool,
    pub sent_to_okx: bool,
}

impl ProgressFlags {
    /// Reset values: warmup marked finished, every other milestone cleared.
    #[must_use]
    pub fn reset_state() -> Self {
        Self {
            warmup_finished: true,
            ..Self::default()
        }
    }

    fn slot(&mut self, flag: Flag) -> &mut bool {
        match flag {
            Flag::WarmupStarted => &mut self.warmup_started,
            Flag::WarmupFinished => &mut self.warmup_finished,
            Flag::OkxWithdrawn => &mut self.okx_withdrawn,
            Flag::PolygonFromUsdcSwapped => &mut self.polygon_from_usdc_swapped,
            Flag::FromPolygonAgeurBridged => &mut self.from_polygon_ageur_bridged,
            Flag::ToPolygonAgeurBridged => &mut self.to_polygon_ageur_bridged,
            Flag::PolygonToUsdcSwapped => &mut self.polygon_to_usdc_swapped,
            Flag::SentToOkx => &mut self.sent_to_okx,
        }
    }
}

/// Boolean progress flags addressable by [`FieldUpdate::Flag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    WarmupStarted,
    WarmupFinished,
    OkxWithdrawn,
    PolygonFromUsdcSwapped,
    FromPolygonAgeurBridged,
    ToPolygonAgeurBridged,
    PolygonToUsdcSwapped,
    SentToOkx,
}

/// A single field mutation applied through the store's update path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    /// Overwrite a route's remaining count.
    Quota(Route, u32),
    /// Decrement a route's remaining count by one.
    DecrementQuota(Route),
    Proxy(Option<String>),
    DepositAddress(Option<String>),
    ChainWithFunds(Option<Chain>),
    Flag(Flag, bool),
    /// Restore every progress flag to its reset value.
    ResetFlags,
}

/// One warmup account.
///
/// Equality is structural over every field. The address is unique within a
/// store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub private_key: String,
    pub address: String,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub deposit_address: Option<String>,
    #[serde(default)]
    pub route_quota: QuotaTable,
    #[serde(flatten)]
    pub flags: ProgressFlags,
}

impl Account {
    #[must_use]
    pub fn new(private_key: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            private_key: private_key.into(),
            address: address.into(),
            proxy: None,
            deposit_address: None,
            route_quota: QuotaTable::new(),
            flags: ProgressFlags::default(),
        }
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    #[must_use]
    pub fn with_deposit_address(mut self, deposit_address: Option<String>) -> Self {
        self.deposit_address = deposit_address;
        self
    }

    #[must_use]
    pub fn with_quota(mut self, route: Route, remaining: u32) -> Self {
        self.route_quota.set(route, remaining);
        self
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.route_quota.is_exhausted()
    }

    /// Address shortened for log lines, e.g. `0x1234…abcd`.
    #[must_use]
    pub fn short_address(&self) -> String {
        let chars: Vec<char> = self.address.chars().collect();
        if chars.len() <= 12 {
            return self.address.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    }

    /// Apply one field update in place.
    pub fn apply(&mut self, update: &FieldUpdate) -> Result<(), DomainError> {
        match update {
            FieldUpdate::Quota(route, remaining) => self.route_quota.set(*route, *remaining),
            FieldUpdate::DecrementQuota(route) => {
                self.route_quota.decrement(route)?;
            }
            FieldUpdate::Proxy(proxy) => self.proxy.clone_from(proxy),
            FieldUpdate::DepositAddress(address) => self.deposit_address.clone_from(address),
            FieldUpdate::ChainWithFunds(chain) => self.flags.chain_with_funds = *chain,
            FieldUpdate::Flag(flag, value) => *self.flags.slot(*flag) = *value,
            FieldUpdate::ResetFlags => self.flags = ProgressFlags::reset_state(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bsc_gnosis() -> Route {
        Route::refuel(Chain::Bsc, Chain::Gnosis).unwrap()
    }

    #[test]
    fn decrement_rejects_underflow_and_leaves_table_intact() {
        let mut table: QuotaTable = [(bsc_gnosis(), 1)].into_iter().collect();
        assert_eq!(table.decrement(&bsc_gnosis()).unwrap(), 0);
        assert_eq!(
            table.decrement(&bsc_gnosis()),
            Err(DomainError::QuotaUnderflow {
                route: bsc_gnosis()
            })
        );
        assert_eq!(table.get(&bsc_gnosis()), Some(0));
    }

    #[test]
    fn decrement_of_untracked_route_fails() {
        let mut table = QuotaTable::new();
        assert!(matches!(
            table.decrement(&Route::stargate()),
            Err(DomainError::UntrackedRoute { .. })
        ));
    }

    #[test]
    fn exhaustion_is_zero_total() {
        let mut table: QuotaTable = [(bsc_gnosis(), 0), (Route::stargate(), 2)]
            .into_iter()
            .collect();
        assert_eq!(table.total(), 2);
        assert!(!table.is_exhausted());
        assert_eq!(table.active().count(), 1);

        table.set(Route::stargate(), 0);
        assert!(table.is_exhausted());
        assert!(QuotaTable::new().is_exhausted());
    }

    #[test]
    fn reset_marks_finished_and_clears_the_rest() {
        let mut account = Account::new("0xkey", "0xabc");
        account
            .apply(&FieldUpdate::ChainWithFunds(Some(Chain::Polygon)))
            .unwrap();
        account
            .apply(&FieldUpdate::Flag(Flag::OkxWithdrawn, true))
            .unwrap();
        account.apply(&FieldUpdate::ResetFlags).unwrap();

        assert!(account.flags.warmup_finished);
        assert!(!account.flags.okx_withdrawn);
        assert_eq!(account.flags.chain_with_funds, None);
    }

    #[test]
    fn serializes_flat_with_route_keys() {
        let account = Account::new("0xkey", "0xabc")
            .with_quota(bsc_gnosis(), 3)
            .with_quota(Route::core_bridge(), 0);
        let json = serde_json::to_value(&account).unwrap();

        assert_eq!(json["route_quota"]["Merkly:BSC-Gnosis"], 3);
        assert_eq!(json["route_quota"]["CoreBridge:BSC-Core"], 0);
        assert_eq!(json["warmup_finished"], false);
        assert!(json["chain_with_funds"].is_null());

        let back: Account = serde_json::from_value(json).unwrap();
        assert_eq!(back, account);
    }

    #[test]
    fn missing_identity_fails_to_deserialize() {
        let result = serde_json::from_str::<Account>(r#"{"address": "0xabc"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn short_address_keeps_both_ends() {
        let account = Account::new("k", "0x1234567890abcdef1234");
        assert_eq!(account.short_address(), "0x1234…1234");
    }

    #[test]
    fn short_address_counts_chars_not_bytes() {
        let account = Account::new("k", "0xé234567890abcdefé23ü");
        assert_eq!(account.short_address(), "0xé234…é23ü");
        assert_eq!(Account::new("k", "0xéé").short_address(), "0xéé");
    }
}
