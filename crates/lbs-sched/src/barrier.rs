use std::collections::VecDeque;

use lbs_model::Change;

/// Tree-refresh barrier.
///
/// While a topology refresh is in flight, new change events are
/// deferred in arrival order and replayed once the refresh completes.
/// At most one refresh wait is outstanding at a time.
#[derive(Debug, Default)]
pub enum Barrier {
    #[default]
    Idle,
    Refreshing {
        queued: VecDeque<Change>,
    },
}

impl Barrier {
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        matches!(self, Barrier::Refreshing { .. })
    }

    /// Idle → Refreshing. Only valid while idle.
    pub fn begin(&mut self) {
        debug_assert!(!self.is_refreshing());
        *self = Barrier::Refreshing {
            queued: VecDeque::new(),
        };
    }

    /// Defer a change while refreshing.
    pub fn defer(&mut self, change: Change) {
        match self {
            Barrier::Refreshing { queued } => queued.push_back(change),
            Barrier::Idle => {
                debug_assert!(false, "defer while idle");
            }
        }
    }

    /// Refreshing → Idle, handing back the deferred changes in order.
    pub fn complete(&mut self) -> VecDeque<Change> {
        match std::mem::take(self) {
            Barrier::Refreshing { queued } => queued,
            Barrier::Idle => VecDeque::new(),
        }
    }

    /// Carry replay leftovers into a re-entered refresh, preserving
    /// their order behind anything already queued.
    pub fn requeue(&mut self, changes: VecDeque<Change>) {
        if let Barrier::Refreshing { queued } = self {
            queued.extend(changes);
        }
    }
}
