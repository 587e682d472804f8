use std::process::ExitCode;

use anyhow::Context;
use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use lbs_conf::Settings;
use lbs_conf::TreesConfig;
use lbs_sched::SchedulerConfig;

use crate::args::GlobalArgs;
use crate::commands::Command;

#[derive(Debug, Parser)]
pub struct Check {
    /// Project root holding lbs.toml and the trees file. Defaults to
    /// the current directory.
    #[arg(long)]
    root: Option<Utf8PathBuf>,
}

impl Command for Check {
    async fn execute(&self, args: &GlobalArgs) -> Result<ExitCode> {
        let root = match &self.root {
            Some(root) => root.clone(),
            None => {
                let cwd = std::env::current_dir().context("Failed to read current directory")?;
                Utf8PathBuf::from_path_buf(cwd)
                    .map_err(|p| anyhow::anyhow!("current directory is not UTF-8: {}", p.display()))?
            }
        };

        let settings = Settings::new(root.as_std_path()).context("Failed to load settings")?;
        let trees_path = if settings.trees.is_absolute() {
            settings.trees.clone()
        } else {
            root.join(&settings.trees)
        };
        let trees = TreesConfig::load(&trees_path)
            .with_context(|| format!("Failed to load trees file {trees_path}"))?;

        let config = SchedulerConfig::from_settings(&settings, &trees);

        if !args.quiet {
            println!("trees file: {trees_path}");
            println!("trees ({}):", config.tree_names.len());
            for name in &config.tree_names {
                println!("  {name}");
            }
            println!("builders:");
            for builder in config.builder_names() {
                println!("  {builder}");
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}
