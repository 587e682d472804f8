use std::collections::BTreeSet;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use lbs_model::TreeName;
use rustc_hash::FxHashMap;

use crate::registry::Registry;

/// Lookup structures for one English/source branch.
#[derive(Debug, Default)]
pub struct BranchIndex {
    /// Directory to trees whose `branch_dirs` contain it.
    pub dir_trees: FxHashMap<Utf8PathBuf, BTreeSet<TreeName>>,
    /// l10n.ini path to trees declaring it.
    pub ini_trees: FxHashMap<Utf8PathBuf, BTreeSet<TreeName>>,
    /// Trees whose top-level directory falls on this branch.
    pub top_level: BTreeSet<TreeName>,
    /// all-locales path to trees sharing it.
    pub all_locales_trees: FxHashMap<Utf8PathBuf, BTreeSet<TreeName>>,
}

impl BranchIndex {
    fn add_dirs(&mut self, tree: &TreeName, dirs: &[Utf8PathBuf]) {
        for dir in dirs {
            self.dir_trees
                .entry(dir.clone())
                .or_default()
                .insert(tree.clone());
        }
    }
}

/// Directory lookup for one localization branch.
#[derive(Debug, Default)]
pub struct L10nIndex {
    dir_trees: FxHashMap<Utf8PathBuf, BTreeSet<TreeName>>,
}

impl L10nIndex {
    fn add_dirs(&mut self, tree: &TreeName, dirs: &[Utf8PathBuf]) {
        for dir in dirs {
            self.dir_trees
                .entry(dir.clone())
                .or_default()
                .insert(tree.clone());
        }
    }

    /// Trees owning any indexed directory that is a path-prefix of
    /// `file`.
    pub fn trees_for_file<'a>(&'a self, file: &'a Utf8Path) -> impl Iterator<Item = &'a TreeName> {
        self.dir_trees
            .iter()
            .filter(move |(dir, _)| file.starts_with(dir))
            .flat_map(|(_, trees)| trees.iter())
    }

    #[must_use]
    pub fn contains_dir(&self, dir: &Utf8Path) -> bool {
        self.dir_trees.contains_key(dir)
    }
}

/// Both index families, always a pure function of the registry.
///
/// Never mutated incrementally; [`build_indices`] rebuilds them in
/// full and the scheduler swaps the result in whole.
#[derive(Debug, Default)]
pub struct Indices {
    pub branches: FxHashMap<String, BranchIndex>,
    pub l10n_branches: FxHashMap<String, L10nIndex>,
}

impl Indices {
    fn branch_mut(&mut self, branch: &str) -> &mut BranchIndex {
        self.branches.entry(branch.to_string()).or_default()
    }

    fn l10n_mut(&mut self, branch: &str) -> &mut L10nIndex {
        self.l10n_branches.entry(branch.to_string()).or_default()
    }
}

/// Rebuild both index families from the registry.
#[must_use]
pub fn build_indices(registry: &Registry) -> Indices {
    let mut indices = Indices::default();
    for (name, tree) in registry.iter() {
        for (branch, dirs) in &tree.branch_dirs {
            indices.branch_mut(branch).add_dirs(name, dirs);
            indices.l10n_mut(&tree.branches.l10n).add_dirs(name, dirs);
        }
        for (branch, inis) in &tree.l10n_inis {
            let index = indices.branch_mut(branch);
            for ini in inis {
                index
                    .ini_trees
                    .entry(ini.clone())
                    .or_default()
                    .insert(name.clone());
            }
        }
        if let Some(tld) = &tree.top_level_dir {
            indices
                .l10n_mut(&tree.branches.l10n)
                .add_dirs(name, std::slice::from_ref(tld));
            indices
                .branch_mut(&tree.branches.en)
                .top_level
                .insert(name.clone());
        }
        if let Some(all_locales) = &tree.all_locales {
            indices
                .branch_mut(&tree.branches.en)
                .all_locales_trees
                .entry(all_locales.clone())
                .or_default()
                .insert(name.clone());
        }
    }
    indices
}
