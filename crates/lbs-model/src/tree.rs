use camino::Utf8PathBuf;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde::Serialize;

use crate::Locale;
use crate::TreeName;

/// The two revision-control branches every tree carries.
///
/// Iteration order is fixed (`en` first, then `l10n`) so that derived
/// job properties come out deterministic.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TreeBranches {
    pub en: String,
    pub l10n: String,
}

impl TreeBranches {
    /// Branch slots as `(key, branch name)` pairs in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [("en", self.en.as_str()), ("l10n", self.l10n.as_str())].into_iter()
    }
}

/// Per-tree metadata: one product/branch configuration describing a
/// localizable codebase.
///
/// Two trees compare equal iff all fields are equal; the registry
/// relies on this to detect unchanged re-registration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub name: TreeName,
    pub repo_url: String,
    pub branches: TreeBranches,
    /// Branch name to ordered, deduplicated l10n.ini paths.
    pub l10n_inis: FxHashMap<String, Vec<Utf8PathBuf>>,
    /// Optional path of a file enumerating supported locales; absent
    /// means the locale set is not auto-discovered.
    pub all_locales: Option<Utf8PathBuf>,
    /// Ordered locale codes currently known for this tree; mutated
    /// only by locale discovery.
    pub locales: Vec<Locale>,
    /// Branch name to source directories relevant to this tree.
    pub branch_dirs: FxHashMap<String, Vec<Utf8PathBuf>>,
    /// Single directory marking a top-level (single-module) tree.
    pub top_level_dir: Option<Utf8PathBuf>,
}

impl Tree {
    pub fn new(
        name: impl Into<TreeName>,
        repo_url: impl Into<String>,
        en_branch: impl Into<String>,
        l10n_branch: impl Into<String>,
        l10n_ini: impl Into<Utf8PathBuf>,
    ) -> Self {
        let en_branch = en_branch.into();
        let mut l10n_inis = FxHashMap::default();
        l10n_inis.insert(en_branch.clone(), vec![l10n_ini.into()]);
        Self {
            name: name.into(),
            repo_url: repo_url.into(),
            branches: TreeBranches {
                en: en_branch,
                l10n: l10n_branch.into(),
            },
            l10n_inis,
            all_locales: None,
            locales: Vec::new(),
            branch_dirs: FxHashMap::default(),
            top_level_dir: None,
        }
    }

    /// Merge per-branch data discovered by a topology refresh.
    ///
    /// Extends the branch's directory list, registers the l10n.ini
    /// path if it is new, and overwrites the top-level marker when one
    /// is given.
    pub fn add_data(
        &mut self,
        branch: &str,
        l10n_ini: Option<&Utf8PathBuf>,
        dirs: &[Utf8PathBuf],
        top_level_dir: Option<Utf8PathBuf>,
    ) {
        self.branch_dirs
            .entry(branch.to_string())
            .or_default()
            .extend(dirs.iter().cloned());
        if let Some(tld) = top_level_dir {
            self.top_level_dir = Some(tld);
        }
        if let Some(ini) = l10n_ini {
            let inis = self.l10n_inis.entry(branch.to_string()).or_default();
            if !inis.contains(ini) {
                inis.push(ini.clone());
            }
        }
    }
}
