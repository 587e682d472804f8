use std::collections::BTreeMap;

use lbs_model::Change;
use lbs_model::Locale;
use lbs_model::TreeName;

/// Pending compare-builds, coalesced per (tree, locale) until the
/// next flush tick.
#[derive(Debug, Default)]
pub struct PendingBuilds {
    pending: BTreeMap<(TreeName, Locale), Vec<Change>>,
    flush_scheduled: bool,
}

impl PendingBuilds {
    /// Record changes for a key, accumulating across calls.
    ///
    /// Returns `true` when the caller should schedule a flush tick —
    /// exactly once per accumulation cycle.
    pub fn add(&mut self, tree: TreeName, locale: Locale, changes: Vec<Change>) -> bool {
        self.pending.entry((tree, locale)).or_default().extend(changes);
        if self.flush_scheduled {
            false
        } else {
            self.flush_scheduled = true;
            true
        }
    }

    /// Take everything pending, resetting the flush schedule.
    pub fn take(&mut self) -> BTreeMap<(TreeName, Locale), Vec<Change>> {
        self.flush_scheduled = false;
        std::mem::take(&mut self.pending)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
