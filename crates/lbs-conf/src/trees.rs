use std::fs;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use tracing::debug;

use crate::ConfigError;

/// The trees file read once at scheduler start.
///
/// A TOML file whose top-level tables are tree names; each name
/// triggers one topology-refresh sub-build at startup. Everything
/// inside a table belongs to the topology builder, not the scheduler,
/// so only the names are consumed here.
#[derive(Clone, Debug, PartialEq)]
pub struct TreesConfig {
    path: Utf8PathBuf,
    names: Vec<String>,
}

impl TreesConfig {
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_std_path())?;
        let value: toml::Value = toml::from_str(&content)?;
        let names: Vec<String> = value
            .as_table()
            .map(|table| {
                table
                    .iter()
                    .filter(|(_, v)| v.is_table())
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default();
        debug!(path = %path, trees = names.len(), "loaded trees file");
        Ok(Self {
            path: path.to_owned(),
            names,
        })
    }

    /// An empty configuration carrying only the file path; used when
    /// startup refreshes are not wanted (tests).
    #[must_use]
    pub fn empty(path: &Utf8Path) -> Self {
        Self {
            path: path.to_owned(),
            names: Vec::new(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}
