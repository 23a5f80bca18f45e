//! Account database persistence across process restarts.

use warmup::application::store::{AccountStore, Settlement};
use warmup::domain::{Chain, FieldUpdate, Flag, Route};
use warmup::error::{Error, StoreError};
use warmup::testkit::domain::{account_with, refuel};

fn route() -> Route {
    refuel(Chain::Bsc, Chain::Gnosis)
}

#[test]
fn progress_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.json");

    let store = AccountStore::new(
        &path,
        vec![
            account_with("0xaaa", &[(route(), 3)]),
            account_with("0xbbb", &[(route(), 1)]),
        ],
    )
    .unwrap();
    store.persist().unwrap();

    let first = store.get(0).unwrap();
    assert_eq!(
        store.settle(&first, &route()).unwrap(),
        Settlement::Decremented { remaining: 2 }
    );
    store
        .update(0, &[FieldUpdate::Flag(Flag::WarmupStarted, true)])
        .unwrap();
    let second = store.get(1).unwrap();
    assert_eq!(store.settle(&second, &route()).unwrap(), Settlement::Retired);
    drop(store);

    let reloaded = AccountStore::load(&path).unwrap();
    assert_eq!(reloaded.len(), 1);
    let account = reloaded.get(0).unwrap();
    assert_eq!(account.address, "0xaaa");
    assert_eq!(account.route_quota.get(&route()), Some(2));
    assert!(account.flags.warmup_started);
}

#[test]
fn reset_flags_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.json");
    let store = AccountStore::new(&path, vec![account_with("0xaaa", &[(route(), 1)])]).unwrap();
    store
        .update(
            0,
            &[
                FieldUpdate::Flag(Flag::OkxWithdrawn, true),
                FieldUpdate::Flag(Flag::SentToOkx, true),
            ],
        )
        .unwrap();

    assert!(store.reset_flags(0).unwrap());
    assert!(!store.reset_flags(7).unwrap());

    let flags = AccountStore::load(&path).unwrap().get(0).unwrap().flags;
    assert!(!flags.okx_withdrawn);
    assert!(!flags.sent_to_okx);
    assert!(flags.warmup_finished);
}

#[test]
fn malformed_file_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.json");
    std::fs::write(&path, "[{\"address\": \"0xabc\"").unwrap();

    let err = AccountStore::load(&path).err().unwrap();
    assert!(matches!(err, Error::Store(StoreError::Decode(_))));
    assert!(err.is_fatal());
}

#[test]
fn record_without_key_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.json");
    std::fs::write(&path, r#"[{"private_key": " ", "address": "0xabc"}]"#).unwrap();

    let err = AccountStore::load(&path).err().unwrap();
    assert!(matches!(
        err,
        Error::Store(StoreError::MissingIdentity {
            index: 0,
            field: "private_key"
        })
    ));
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AccountStore::load(dir.path().join("absent.json")).err().unwrap();
    assert!(matches!(err, Error::Store(StoreError::Read { .. })));
}

#[test]
fn persist_and_load_preserve_every_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.json");

    let mut account = account_with("0xAbC", &[(route(), 4), (Route::stargate(), 0)])
        .with_proxy(Some("user:pass@10.0.0.1:8080".into()))
        .with_deposit_address(Some("0xdeposit".into()));
    account.flags.chain_with_funds = Some(Chain::Polygon);
    account.flags.okx_withdrawn = true;
    let other = account_with("0xdef", &[(Route::core_bridge(), 2)]);

    let store = AccountStore::new(&path, vec![account.clone(), other.clone()]).unwrap();
    store.persist().unwrap();

    let reloaded = AccountStore::load(&path).unwrap();
    assert_eq!(reloaded.snapshot(), vec![account, other]);
}
