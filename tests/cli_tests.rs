//! CLI integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use warmup::testkit::config::toml_in;

/// Well-known development key (first Hardhat/Anvil account).
const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

fn warmup() -> Command {
    let mut cmd = cargo_bin_cmd!("warmup");
    cmd.env_remove("ZEROX_API_KEY")
        .env_remove("OKX_API_KEY")
        .env_remove("TELEGRAM_BOT_TOKEN");
    cmd
}

fn workspace(dir: &Path) -> PathBuf {
    let config = dir.join("config.toml");
    fs::write(&config, toml_in(dir)).unwrap();
    fs::write(dir.join("private_keys.txt"), format!("{DEV_KEY}\n")).unwrap();
    config
}

#[test]
fn test_help_lists_commands() {
    warmup()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("reset"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_version() {
    warmup()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("warmup"));
}

#[test]
fn check_accepts_valid_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());

    warmup()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file is valid"))
        .stdout(predicate::str::contains("Merkly:BSC-Gnosis"));
}

#[test]
fn check_rejects_config_without_routes() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[execution]\nworkers = 2\n").unwrap();

    warmup()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("routes"));
}

#[test]
fn status_without_database_hints_at_build() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());

    warmup()
        .arg("status")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("warmup build"));
}

#[test]
fn build_then_status_then_reset() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());

    warmup()
        .args(["--json", "build", "--yes", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"accounts\":1"));
    assert!(dir.path().join("database.json").exists());

    warmup()
        .args(["--json", "status", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains(DEV_ADDRESS))
        .stdout(predicate::str::contains("Merkly:BSC-Gnosis"));

    warmup()
        .args(["reset", "0", "--config"])
        .arg(&config)
        .assert()
        .success();

    warmup()
        .args(["reset", "3", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no account at index 3"));
}

#[test]
fn build_refuses_to_overwrite_without_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());
    fs::write(dir.path().join("database.json"), "[]").unwrap();

    warmup()
        .args(["--json", "build", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    assert_eq!(
        fs::read_to_string(dir.path().join("database.json")).unwrap(),
        "[]"
    );
}

#[test]
fn run_on_finished_database_exits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let config = workspace(dir.path());
    fs::write(dir.path().join("database.json"), "[]").unwrap();

    warmup()
        .args(["run", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("finished"));
}
