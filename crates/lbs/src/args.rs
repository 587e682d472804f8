use camino::Utf8PathBuf;
use clap::Parser;

#[derive(Parser)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct GlobalArgs {
    /// Suppress all output except errors.
    #[arg(global = true, long, short, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Increase log verbosity (repeatable).
    #[arg(global = true, action = clap::ArgAction::Count, long, short, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Directory the rolling log file is written to.
    #[arg(global = true, long, default_value = "/tmp")]
    pub log_dir: Utf8PathBuf,
}

impl GlobalArgs {
    /// Default tracing directive for the chosen verbosity.
    #[must_use]
    pub fn log_directive(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}
