//! Command-line interface definitions.
//!
//! Defines the CLI structure for the warmup tool using `clap`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Resumable cross-chain account warmup
#[derive(Parser, Debug)]
#[command(name = "warmup")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the warmup CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the account database from the key, proxy and deposit-address files
    Build(BuildArgs),

    /// Run the warmup loop until every account is done (Ctrl-C to stop)
    Run(RunArgs),

    /// Show remaining work per account
    Status(ConfigPathArg),

    /// Reset the progress flags of one account
    Reset(ResetArgs),

    /// Validate the configuration and print a summary
    Check(ConfigPathArg),
}

/// Shared argument for commands that only need a config path.
#[derive(Args, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Arguments for the `build` subcommand.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Overwrite an existing database without asking
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,

    /// Override the number of concurrent workers
    #[arg(long)]
    pub workers: Option<usize>,
}

/// Arguments for the `reset` subcommand.
#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Account index as shown by `warmup status`
    pub index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_overrides() {
        let cli = Cli::parse_from([
            "warmup",
            "run",
            "-c",
            "custom.toml",
            "--log-level",
            "debug",
            "--json-logs",
            "--workers",
            "4",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config, PathBuf::from("custom.toml"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.json_logs);
        assert_eq!(args.workers, Some(4));
    }

    #[test]
    fn reset_takes_positional_index() {
        let cli = Cli::parse_from(["warmup", "reset", "3"]);
        let Commands::Reset(args) = cli.command else {
            panic!("expected reset");
        };
        assert_eq!(args.index, 3);
        assert_eq!(args.config, PathBuf::from("config.toml"));
    }
}
