//! CLI module graph.

pub mod build;
pub mod check;
pub mod command;
pub mod output;
pub mod reset;
pub mod run;
pub mod status;

use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use command::{Cli, Commands};

/// Dispatch a parsed command line.
pub async fn dispatch(cli: Cli) -> Result<()> {
    output::configure(output::OutputConfig::new(cli.json, cli.quiet));

    match cli.command {
        Commands::Build(args) => build::execute(&args),
        Commands::Run(args) => run::execute(&args).await,
        Commands::Status(args) => status::execute(&args.config),
        Commands::Reset(args) => reset::execute(&args),
        Commands::Check(args) => check::execute(&args.config),
    }
}

/// Load configuration and start logging from its `[logging]` section.
pub(crate) fn load_config(path: &std::path::Path) -> Result<Config> {
    let config = Config::load(path)?;
    config.logging.init();
    Ok(config)
}
