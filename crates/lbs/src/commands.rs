mod check;
mod locales;

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::args::GlobalArgs;

pub trait Command {
    async fn execute(&self, args: &GlobalArgs) -> Result<ExitCode>;
}

#[derive(Debug, Subcommand)]
pub enum LbsCommand {
    /// Validate the scheduler configuration and trees file
    Check(self::check::Check),
    /// Fetch and parse an all-locales file for a configured tree
    Locales(self::locales::Locales),
}

impl Command for LbsCommand {
    async fn execute(&self, args: &GlobalArgs) -> Result<ExitCode> {
        match self {
            Self::Check(cmd) => cmd.execute(args).await,
            Self::Locales(cmd) => cmd.execute(args).await,
        }
    }
}
