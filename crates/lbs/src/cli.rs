use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::args::Args;
use crate::commands::Command;
use crate::commands::LbsCommand;
use crate::logging;

/// Top-level argument structure: one subcommand plus the global flags.
#[derive(Parser)]
#[command(name = "lbs")]
#[command(version, about = "Localization build scheduler tooling")]
pub struct Cli {
    #[command(subcommand)]
    pub command: LbsCommand,

    #[command(flatten)]
    pub args: Args,
}

/// Parse the argument vector, set up logging and dispatch.
pub async fn run(args: Vec<String>) -> Result<ExitCode> {
    let cli = Cli::try_parse_from(args).unwrap_or_else(|e| {
        e.exit();
    });

    let _guard = logging::init_tracing(&cli.args.global);
    tracing::debug!("logging initialized");

    cli.command.execute(&cli.args.global).await
}
