use std::path::Path;

use camino::Utf8PathBuf;
use config::Config;
use config::ConfigError as ExternalConfigError;
use config::File;
use config::FileFormat;
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration build/deserialize error")]
    Config(#[from] ExternalConfigError),
    #[error("Failed to read trees file")]
    TreesIo(#[from] std::io::Error),
    #[error("Failed to parse trees file TOML")]
    TreesParse(#[from] toml::de::Error),
}

fn default_tree_builder() -> String {
    "treeinfo".to_string()
}

fn default_trees() -> Utf8PathBuf {
    Utf8PathBuf::from("l10nbuilds.toml")
}

fn default_fetch_timeout_ms() -> u64 {
    5_000
}

fn default_user_agent() -> String {
    "lbs/1.0".to_string()
}

/// Scheduler settings, layered from the user config directory and the
/// project root (`lbs.toml`, then `.lbs.toml`, later sources winning).
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Builder names compare-build jobs are submitted to.
    pub builders: Vec<String>,
    /// Builder that re-derives tree topology from remote l10n.ini files.
    pub tree_builder: String,
    /// Path of the trees file enumerating the configured trees.
    pub trees: Utf8PathBuf,
    /// Timeout for the all-locales fetch.
    pub fetch_timeout_ms: u64,
    /// User-Agent header sent with the all-locales fetch.
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            builders: Vec::new(),
            tree_builder: default_tree_builder(),
            trees: default_trees(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Settings {
    pub fn new(project_root: &Path) -> Result<Self, ConfigError> {
        let user_config_file = ProjectDirs::from("com.github", "lbs", "lbs")
            .map(|proj_dirs| proj_dirs.config_dir().join("lbs.toml"));

        Self::load_from_paths(project_root, user_config_file.as_deref())
    }

    fn load_from_paths(
        project_root: &Path,
        user_config_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = user_config_path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        builder = builder.add_source(
            File::from(project_root.join("lbs.toml"))
                .format(FileFormat::Toml)
                .required(false),
        );

        builder = builder.add_source(
            File::from(project_root.join(".lbs.toml"))
                .format(FileFormat::Toml)
                .required(false),
        );

        let config = builder.build()?;
        let settings = config.try_deserialize()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    mod defaults {
        use super::*;

        #[test]
        fn load_no_files() {
            let dir = tempdir().unwrap();
            let settings = Settings::load_from_paths(dir.path(), None).unwrap();
            assert_eq!(settings, Settings::default());
            assert_eq!(settings.fetch_timeout_ms, 5_000);
            assert_eq!(settings.tree_builder, "treeinfo");
        }
    }

    mod project_files {
        use super::*;

        #[test]
        fn load_lbs_toml() {
            let dir = tempdir().unwrap();
            fs::write(
                dir.path().join("lbs.toml"),
                "builders = [\"compare\"]\ntrees = \"trees.toml\"\n",
            )
            .unwrap();
            let settings = Settings::load_from_paths(dir.path(), None).unwrap();
            assert_eq!(settings.builders, vec!["compare".to_string()]);
            assert_eq!(settings.trees, Utf8PathBuf::from("trees.toml"));
        }

        #[test]
        fn load_dot_lbs_toml() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join(".lbs.toml"), "fetch_timeout_ms = 250\n").unwrap();
            let settings = Settings::load_from_paths(dir.path(), None).unwrap();
            assert_eq!(settings.fetch_timeout_ms, 250);
        }
    }

    mod priority {
        use super::*;

        #[test]
        fn dot_lbs_overrides_lbs() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("lbs.toml"), "tree_builder = \"a\"\n").unwrap();
            fs::write(dir.path().join(".lbs.toml"), "tree_builder = \"b\"\n").unwrap();
            let settings = Settings::load_from_paths(dir.path(), None).unwrap();
            assert_eq!(settings.tree_builder, "b");
        }

        #[test]
        fn project_overrides_user_config() {
            let dir = tempdir().unwrap();
            let user = tempdir().unwrap();
            let user_file = user.path().join("lbs.toml");
            fs::write(&user_file, "user_agent = \"user\"\n").unwrap();
            fs::write(dir.path().join("lbs.toml"), "user_agent = \"project\"\n").unwrap();
            let settings = Settings::load_from_paths(dir.path(), Some(&user_file)).unwrap();
            assert_eq!(settings.user_agent, "project");
        }
    }
}
