/// A localization repository known to the metadata store.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Repository {
    pub name: String,
    /// Path of the repository relative to the hosting root; differs
    /// from `name` for mirrored/relocated repositories.
    pub relative_path: String,
}

/// A recorded batch of changesets applied to a repository at one time.
///
/// `revision` is the latest changeset on the `default` line of the
/// push.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Push {
    pub date: Option<i64>,
    pub revision: String,
}

/// A named grouping of localization repositories sharing a common
/// l10n branch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Forest {
    pub name: String,
    pub relative_path: String,
}

/// The external metadata store mapping tree names to repositories and
/// revision history.
///
/// Lookups are synchronous; implementations back them with whatever
/// store they like and use interior mutability for the writes.
pub trait MetadataService: Send + Sync {
    /// Idempotent get-or-create of a forest. The `bool` reports
    /// whether the forest had to be created, which callers treat as
    /// configuration drift worth a warning.
    fn ensure_forest(&self, name: &str) -> (Forest, bool);

    /// The forest a tree record currently points at, if the tree is
    /// known at all.
    fn tree_forest(&self, code: &str) -> Option<String>;

    /// Create the tree record or repoint it at `forest`.
    fn bind_tree(&self, code: &str, forest: &str);

    fn repository(&self, name: &str) -> Option<Repository>;

    /// Most recent push on the `default` line at or before `before`
    /// (no bound when `before` is unset).
    fn latest_push(&self, repo: &Repository, before: Option<i64>) -> Option<Push>;

    /// Most recent changeset on the `default` line; guaranteed to
    /// resolve, falling back to the null placeholder revision.
    fn latest_changeset(&self, repo: &Repository) -> String;

    fn forest(&self, name: &str) -> Option<Forest>;
}
