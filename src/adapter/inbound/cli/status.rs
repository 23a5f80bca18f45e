//! Handler for the `status` command.

use std::path::Path;

use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::{load_config, output};
use crate::domain::Account;
use crate::error::Result;
use crate::infrastructure::bootstrap;

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Proxy")]
    proxy: &'static str,
    #[tabled(rename = "Remaining")]
    remaining: u64,
    #[tabled(rename = "Routes")]
    routes: String,
}

fn remaining_routes(account: &Account) -> String {
    let mut routes: Vec<String> = account
        .route_quota
        .active()
        .map(|(route, n)| format!("{route} ×{n}"))
        .collect();
    routes.sort();
    routes.join(", ")
}

fn row(index: usize, account: &Account) -> AccountRow {
    AccountRow {
        index,
        address: account.short_address(),
        proxy: if account.proxy.is_some() { "yes" } else { "-" },
        remaining: account.route_quota.total(),
        routes: remaining_routes(account),
    }
}

/// Print remaining work per account.
pub fn execute(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let store = bootstrap::load_store(&config)?;
    let accounts = store.snapshot();

    if output::is_json() {
        let rows: Vec<_> = accounts
            .iter()
            .enumerate()
            .map(|(index, account)| {
                let routes: serde_json::Map<String, serde_json::Value> = account
                    .route_quota
                    .iter()
                    .map(|(route, n)| (route.to_string(), json!(n)))
                    .collect();
                json!({
                    "index": index,
                    "address": account.address,
                    "remaining": account.route_quota.total(),
                    "routes": routes,
                })
            })
            .collect();
        output::json_output(json!({ "command": "status", "accounts": rows }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Database", config.paths.database.display());
    output::field("Accounts", accounts.len());
    output::field(
        "Actions left",
        accounts.iter().map(|a| a.route_quota.total()).sum::<u64>(),
    );

    if accounts.is_empty() {
        output::success("Every account has finished its warmup");
        return Ok(());
    }

    let rows: Vec<AccountRow> = accounts
        .iter()
        .enumerate()
        .map(|(index, account)| row(index, account))
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!();
    output::block(&table.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Chain, Route};
    use crate::testkit::domain::account_with;

    #[test]
    fn row_lists_only_routes_with_work() {
        let refuel = Route::refuel(Chain::Bsc, Chain::Gnosis).unwrap();
        let account = account_with(
            "0x1234567890abcdef1234567890abcdef12345678",
            &[(refuel, 2), (Route::stargate(), 0)],
        );
        let row = row(4, &account);
        assert_eq!(row.index, 4);
        assert_eq!(row.remaining, 2);
        assert_eq!(row.routes, "Merkly:BSC-Gnosis ×2");
        assert_eq!(row.proxy, "-");
    }
}
