//! Builders for domain primitives used across tests.

use crate::domain::{Account, Chain, Route};

/// Create an account with a fake key and the given address.
pub fn account(address: &str) -> Account {
    Account::new(format!("key-{address}"), address)
}

/// Create an account with `quota` remaining on each route.
pub fn account_with(address: &str, quota: &[(Route, u32)]) -> Account {
    quota
        .iter()
        .fold(account(address), |acc, (route, n)| acc.with_quota(*route, *n))
}

/// Generate `n` accounts named `0x0`, `0x1`, ... with the same quota.
pub fn accounts(n: usize, quota: &[(Route, u32)]) -> Vec<Account> {
    (0..n)
        .map(|i| account_with(&format!("0x{i}"), quota))
        .collect()
}

/// A Merkly refuel route. Panics on an invalid pair.
pub fn refuel(from: Chain, to: Chain) -> Route {
    Route::refuel(from, to).expect("valid refuel route")
}
