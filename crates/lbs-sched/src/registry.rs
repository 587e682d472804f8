use lbs_model::Tree;
use lbs_model::TreeName;
use rustc_hash::FxHashMap;

/// All trees known to the scheduler, keyed by name.
///
/// Populated at startup and updated incrementally by topology
/// refreshes; never shrinks during normal operation.
#[derive(Debug, Default)]
pub struct Registry {
    trees: FxHashMap<TreeName, Tree>,
}

impl Registry {
    #[must_use]
    pub fn get(&self, name: &TreeName) -> Option<&Tree> {
        self.trees.get(name)
    }

    pub fn get_mut(&mut self, name: &TreeName) -> Option<&mut Tree> {
        self.trees.get_mut(name)
    }

    pub fn insert(&mut self, tree: Tree) -> Option<Tree> {
        self.trees.insert(tree.name.clone(), tree)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TreeName, &Tree)> {
        self.trees.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}
