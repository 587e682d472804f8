use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use lbs_conf::Settings;
use lbs_model::parse_locales;
use lbs_remote::HttpLocaleSource;
use lbs_remote::LocaleSource;

use crate::args::GlobalArgs;
use crate::commands::Command;

#[derive(Debug, Parser)]
pub struct Locales {
    /// URL of the all-locales file to fetch.
    url: String,
}

impl Command for Locales {
    async fn execute(&self, args: &GlobalArgs) -> Result<ExitCode> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let settings = Settings::new(&cwd).context("Failed to load settings")?;

        let source = HttpLocaleSource::new(
            Duration::from_millis(settings.fetch_timeout_ms),
            &settings.user_agent,
        )
        .context("Failed to build HTTP client")?;
        let body = source
            .fetch(&self.url)
            .await
            .with_context(|| format!("Failed to fetch {}", self.url))?;

        let locales = parse_locales(&body);
        if !args.quiet {
            for locale in &locales {
                println!("{locale}");
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}
