//! Durable account database.
//!
//! The store owns every [`Account`] and writes the full snapshot to a JSON
//! file after each mutation. Mutations build the next snapshot, write it
//! (temp file then rename) and only then swap it in, so a failed write
//! leaves both the file and the in-memory state untouched.
//!
//! Reads take the shared lock; mutations and persistence hold the write lock
//! for the whole read-modify-persist sequence.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use rand::seq::IteratorRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::domain::{Account, CountRange, FieldUpdate, Route};
use crate::error::{Result, StoreError};

/// Raw inputs the database is built from, one entry per line of the input
/// files.
#[derive(Debug, Clone, Default)]
pub struct AccountSeeds {
    pub keys: Vec<String>,
    pub proxies: Vec<String>,
    pub deposit_addresses: Vec<String>,
    /// Reuse the first proxy for every account.
    pub mobile_proxy: bool,
}

/// What [`AccountStore::settle`] did after a successful action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Quota decremented; the account still has this much work left.
    Decremented { remaining: u64 },
    /// Quota decremented to zero total and the account was removed.
    Retired,
    /// The route's quota was already zero; nothing changed.
    Underflow,
    /// The account is no longer in the store; nothing changed.
    Missing,
}

/// Thread-safe account collection backed by a JSON file.
pub struct AccountStore {
    path: PathBuf,
    accounts: RwLock<Vec<Account>>,
}

impl AccountStore {
    /// Wrap an in-memory collection without touching disk.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateAddress`] or
    /// [`StoreError::MissingIdentity`] if the collection is inconsistent.
    pub fn new(path: impl Into<PathBuf>, accounts: Vec<Account>) -> Result<Self> {
        validate(&accounts)?;
        Ok(Self {
            path: path.into(),
            accounts: RwLock::new(accounts),
        })
    }

    /// Build a fresh database from raw key, proxy and deposit-address lists.
    ///
    /// Inputs are zipped positionally; a shorter list leaves later accounts
    /// without that field. Keys whose address cannot be derived, and keys
    /// that derive an address already seen, are logged and skipped. Each
    /// account gets an independent quota draw per route. Nothing is written
    /// until [`persist`](Self::persist) is called.
    pub fn build<R, F>(
        path: impl Into<PathBuf>,
        seeds: AccountSeeds,
        quotas: &[(Route, CountRange)],
        derive_address: F,
        rng: &mut R,
    ) -> Result<Self>
    where
        R: Rng + ?Sized,
        F: Fn(&str) -> Result<String>,
    {
        let AccountSeeds {
            keys,
            mut proxies,
            deposit_addresses,
            mobile_proxy,
        } = seeds;

        if mobile_proxy {
            if let Some(first) = proxies.first().cloned() {
                proxies = vec![first; keys.len()];
            }
        }

        let mut seen = HashSet::new();
        let mut accounts = Vec::with_capacity(keys.len());

        for (position, key) in keys.into_iter().enumerate() {
            let address = match derive_address(&key) {
                Ok(address) => address,
                Err(e) => {
                    warn!(line = position + 1, error = %e, "Skipping key: address derivation failed");
                    continue;
                }
            };
            if !seen.insert(address.to_lowercase()) {
                warn!(line = position + 1, address = %address, "Skipping duplicate account");
                continue;
            }

            let mut account = Account::new(key, address)
                .with_proxy(proxies.get(position).cloned())
                .with_deposit_address(deposit_addresses.get(position).cloned());
            for (route, range) in quotas {
                account.route_quota.set(*route, range.sample(rng));
            }
            accounts.push(account);
        }

        info!(accounts = accounts.len(), "Built account database");
        Self::new(path, accounts)
    }

    /// Load the database written by a previous run.
    ///
    /// # Errors
    ///
    /// Any unreadable file, malformed record, record with an empty key or
    /// address, or duplicated address fails the whole load.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        let accounts: Vec<Account> = serde_json::from_str(&content).map_err(StoreError::Decode)?;
        debug!(path = %path.display(), accounts = accounts.len(), "Loaded account database");
        Self::new(path, accounts)
    }

    /// Rewrite the backing file with the current snapshot.
    pub fn persist(&self) -> Result<()> {
        let accounts = self.accounts.write();
        write_snapshot(&self.path, &accounts)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }

    /// Copy of every record, in storage order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Account> {
        self.accounts.read().clone()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Account> {
        self.accounts.read().get(index).cloned()
    }

    /// Uniformly random record with its index.
    pub fn random_account<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(Account, usize)> {
        let accounts = self.accounts.read();
        if accounts.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..accounts.len());
        Some((accounts[index].clone(), index))
    }

    /// Every record matching `predicate`.
    pub fn query<P>(&self, predicate: P) -> Vec<Account>
    where
        P: Fn(&Account) -> bool,
    {
        self.accounts
            .read()
            .iter()
            .filter(|account| predicate(account))
            .cloned()
            .collect()
    }

    /// Uniformly random record among those matching `predicate`.
    pub fn random_matching<R, P>(&self, predicate: P, rng: &mut R) -> Option<(Account, usize)>
    where
        R: Rng + ?Sized,
        P: Fn(&Account) -> bool,
    {
        let accounts = self.accounts.read();
        let (index, account) = accounts
            .iter()
            .enumerate()
            .filter(|(_, account)| predicate(account))
            .choose(rng)?;
        Some((account.clone(), index))
    }

    /// Position of a structurally equal record.
    #[must_use]
    pub fn index_of(&self, account: &Account) -> Option<usize> {
        self.accounts.read().iter().position(|a| a == account)
    }

    /// Position of the record with `address`.
    #[must_use]
    pub fn position_of(&self, address: &str) -> Option<usize> {
        self.accounts
            .read()
            .iter()
            .position(|a| a.address.eq_ignore_ascii_case(address))
    }

    /// Apply `updates` to the record at `index`, then persist.
    ///
    /// Returns `Ok(false)` without changing anything when the index is out
    /// of bounds or an update would break an invariant (quota underflow).
    /// Only a failed write is an error.
    pub fn update(&self, index: usize, updates: &[FieldUpdate]) -> Result<bool> {
        let mut accounts = self.accounts.write();
        let Some(current) = accounts.get(index) else {
            warn!(index, len = accounts.len(), "Account index out of bounds, update ignored");
            return Ok(false);
        };

        let mut updated = current.clone();
        for update in updates {
            if let Err(e) = updated.apply(update) {
                warn!(index, error = %e, "Update rejected");
                return Ok(false);
            }
        }

        let mut next = accounts.clone();
        next[index] = updated;
        write_snapshot(&self.path, &next)?;
        *accounts = next;
        Ok(true)
    }

    /// Reset the progress flags of the record at `index`.
    pub fn reset_flags(&self, index: usize) -> Result<bool> {
        self.update(index, &[FieldUpdate::ResetFlags])
    }

    /// Remove the stored record with `account`'s address if its quota is
    /// exhausted, then persist.
    pub fn remove_if_exhausted(&self, account: &Account) -> Result<bool> {
        let mut accounts = self.accounts.write();
        let Some(index) = find(&accounts, &account.address) else {
            return Ok(false);
        };
        if !accounts[index].is_exhausted() {
            return Ok(false);
        }

        let mut next = accounts.clone();
        next.remove(index);
        write_snapshot(&self.path, &next)?;
        *accounts = next;
        Ok(true)
    }

    /// Record one successful execution of `route` for `account`.
    ///
    /// Decrements the quota, removes the account if that exhausted it, and
    /// persists, all under a single write lock.
    pub fn settle(&self, account: &Account, route: &Route) -> Result<Settlement> {
        let mut accounts = self.accounts.write();
        let Some(index) = find(&accounts, &account.address) else {
            return Ok(Settlement::Missing);
        };

        let mut updated = accounts[index].clone();
        if let Err(e) = updated.route_quota.decrement(route) {
            warn!(address = %account.address, error = %e, "Quota decrement rejected");
            return Ok(Settlement::Underflow);
        }

        let mut next = accounts.clone();
        let settlement = if updated.is_exhausted() {
            next.remove(index);
            Settlement::Retired
        } else {
            let remaining = updated.route_quota.total();
            next[index] = updated;
            Settlement::Decremented { remaining }
        };

        write_snapshot(&self.path, &next)?;
        *accounts = next;
        Ok(settlement)
    }
}

fn find(accounts: &[Account], address: &str) -> Option<usize> {
    accounts
        .iter()
        .position(|a| a.address.eq_ignore_ascii_case(address))
}

fn validate(accounts: &[Account]) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, account) in accounts.iter().enumerate() {
        if account.private_key.trim().is_empty() {
            return Err(StoreError::MissingIdentity {
                index,
                field: "private_key",
            }
            .into());
        }
        if account.address.trim().is_empty() {
            return Err(StoreError::MissingIdentity {
                index,
                field: "address",
            }
            .into());
        }
        if !seen.insert(account.address.to_lowercase()) {
            return Err(StoreError::DuplicateAddress {
                address: account.address.clone(),
            }
            .into());
        }
    }
    Ok(())
}

/// Write the snapshot with the write-to-temp-then-rename pattern.
fn write_snapshot(path: &Path, accounts: &[Account]) -> Result<()> {
    let json = serde_json::to_string_pretty(accounts).map_err(StoreError::Encode)?;
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path).map_err(write_err)?;

    let cleanup_and_err = |e| {
        let _ = fs::remove_file(&temp_path);
        write_err(e)
    };

    file.write_all(json.as_bytes()).map_err(cleanup_and_err)?;
    file.sync_all().map_err(cleanup_and_err)?;
    fs::rename(&temp_path, path).map_err(cleanup_and_err)?;

    debug!(path = %path.display(), accounts = accounts.len(), "Persisted account database");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Chain;
    use crate::error::Error;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn route() -> Route {
        Route::refuel(Chain::Bsc, Chain::Gnosis).unwrap()
    }

    fn account(address: &str, quota: u32) -> Account {
        Account::new(format!("key-{address}"), address).with_quota(route(), quota)
    }

    fn store(dir: &tempfile::TempDir, accounts: Vec<Account>) -> AccountStore {
        AccountStore::new(dir.path().join("database.json"), accounts).unwrap()
    }

    #[test]
    fn build_zips_inputs_and_skips_bad_keys() {
        let seeds = AccountSeeds {
            keys: vec!["k1".into(), "bad".into(), "k3".into(), "k1".into()],
            proxies: vec!["p1".into()],
            deposit_addresses: vec!["d1".into(), "d2".into(), "d3".into()],
            mobile_proxy: false,
        };
        let derive = |key: &str| -> Result<String> {
            if key == "bad" {
                return Err(crate::error::ChainError::InvalidKey(key.into()).into());
            }
            Ok(format!("0x{key}"))
        };
        let mut rng = StdRng::seed_from_u64(3);
        let store = AccountStore::build(
            "unused.json",
            seeds,
            &[(route(), CountRange::new(2, 2))],
            derive,
            &mut rng,
        )
        .unwrap();

        let accounts = store.snapshot();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].proxy.as_deref(), Some("p1"));
        assert_eq!(accounts[0].deposit_address.as_deref(), Some("d1"));
        assert_eq!(accounts[1].address, "0xk3");
        assert_eq!(accounts[1].proxy, None);
        assert_eq!(accounts[1].deposit_address.as_deref(), Some("d3"));
        assert_eq!(accounts[1].route_quota.get(&route()), Some(2));
    }

    #[test]
    fn mobile_proxy_is_shared_by_every_account() {
        let seeds = AccountSeeds {
            keys: vec!["a".into(), "b".into(), "c".into()],
            proxies: vec!["mobile".into()],
            deposit_addresses: vec![],
            mobile_proxy: true,
        };
        let mut rng = StdRng::seed_from_u64(3);
        let store = AccountStore::build(
            "unused.json",
            seeds,
            &[],
            |key: &str| Ok(format!("0x{key}")),
            &mut rng,
        )
        .unwrap();

        assert!(store
            .snapshot()
            .iter()
            .all(|a| a.proxy.as_deref() == Some("mobile")));
    }

    #[test]
    fn duplicate_addresses_are_rejected() {
        let result = AccountStore::new("db.json", vec![account("0xA", 1), account("0xa", 2)]);
        assert!(matches!(
            result,
            Err(Error::Store(StoreError::DuplicateAddress { .. }))
        ));
    }

    #[test]
    fn settle_decrements_then_retires() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, vec![account("0xa", 2)]);
        let record = store.get(0).unwrap();

        assert_eq!(
            store.settle(&record, &route()).unwrap(),
            Settlement::Decremented { remaining: 1 }
        );
        assert_eq!(store.settle(&record, &route()).unwrap(), Settlement::Retired);
        assert!(store.is_empty());
        assert_eq!(store.settle(&record, &route()).unwrap(), Settlement::Missing);
    }

    #[test]
    fn settle_reports_underflow_without_change() {
        let dir = tempfile::tempdir().unwrap();
        let record = account("0xa", 0).with_quota(Route::stargate(), 1);
        let store = store(&dir, vec![record.clone()]);

        assert_eq!(store.settle(&record, &route()).unwrap(), Settlement::Underflow);
        assert_eq!(store.get(0).unwrap(), record);
    }

    #[test]
    fn remove_if_exhausted_only_removes_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, vec![account("0xa", 1), account("0xb", 0)]);

        assert!(!store.remove_if_exhausted(&account("0xa", 1)).unwrap());
        assert!(store.remove_if_exhausted(&account("0xb", 0)).unwrap());
        assert_eq!(store.len(), 1);

        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            let (picked, _) = store.random_account(&mut rng).unwrap();
            assert_eq!(picked.address, "0xa");
        }
    }

    #[test]
    fn update_out_of_bounds_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, vec![account("0xa", 1)]);
        assert!(!store.update(5, &[FieldUpdate::Proxy(None)]).unwrap());
        assert!(!dir.path().join("database.json").exists());
    }

    #[test]
    fn update_persists_and_reset_restores_flags() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, vec![account("0xa", 1)]);

        assert!(store
            .update(0, &[FieldUpdate::ChainWithFunds(Some(Chain::Celo))])
            .unwrap());
        let reloaded = AccountStore::load(store.path()).unwrap();
        assert_eq!(
            reloaded.get(0).unwrap().flags.chain_with_funds,
            Some(Chain::Celo)
        );

        assert!(store.reset_flags(0).unwrap());
        let flags = store.get(0).unwrap().flags;
        assert!(flags.warmup_finished);
        assert_eq!(flags.chain_with_funds, None);
    }

    #[test]
    fn failed_write_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the target path makes the rename fail.
        let path = dir.path().join("database.json");
        fs::create_dir(&path).unwrap();
        let record = account("0xa", 2);
        let store = AccountStore::new(&path, vec![record.clone()]).unwrap();

        let err = store.settle(&record, &route()).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(store.get(0).unwrap(), record);
    }

    #[test]
    fn random_matching_respects_predicate() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, vec![account("0xa", 1), account("0xb", 1)]);
        let mut rng = StdRng::seed_from_u64(1);

        let (picked, index) = store
            .random_matching(|a| a.address == "0xb", &mut rng)
            .unwrap();
        assert_eq!(picked.address, "0xb");
        assert_eq!(index, 1);
        assert!(store.random_matching(|_| false, &mut rng).is_none());
        assert_eq!(store.index_of(&picked), Some(1));
        assert_eq!(store.query(|a| a.route_quota.total() == 1).len(), 2);
    }
}
