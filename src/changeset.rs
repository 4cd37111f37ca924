/// Changeset - Change Tracking for Record Collections
///
/// Every mutation of a Table appends a `RecordChange` and moves the table's
/// revision forward. Views remember the revision they last synced to and read
/// only the changes after it: removed keys are pruned from their selection,
/// and any change at all invalidates their cached ordering.
///
/// # Revisions
///
/// The revision is the total number of changes ever recorded. Compaction drops
/// old changes but never rewinds the revision, so a view holding a revision
/// older than the retained window knows it has to re-check everything.

use crate::record::RecordKey;

/// Represents a single change to a record collection
#[derive(Debug, Clone, PartialEq)]
pub enum RecordChange {
    /// A record was inserted at the given position
    Inserted { key: RecordKey, index: usize },

    /// A record was removed from the given position
    Removed { key: RecordKey, index: usize },

    /// A record's fields changed in place (its key did not)
    Updated { key: RecordKey },

    /// The whole collection was replaced
    Reset,
}

impl RecordChange {
    /// Returns the key affected by this change, if it names one
    pub fn key(&self) -> Option<&RecordKey> {
        match self {
            RecordChange::Inserted { key, .. } => Some(key),
            RecordChange::Removed { key, .. } => Some(key),
            RecordChange::Updated { key } => Some(key),
            RecordChange::Reset => None,
        }
    }

    /// Returns true if keys may have left the collection
    pub fn drops_keys(&self) -> bool {
        matches!(self, RecordChange::Removed { .. } | RecordChange::Reset)
    }
}

/// Ordered log of changes with a monotonically increasing revision
#[derive(Debug, Clone, Default)]
pub struct Changeset {
    changes: Vec<RecordChange>,
    /// Revision of the first retained change
    base_revision: u64,
}

impl Changeset {
    pub fn new() -> Self {
        Changeset {
            changes: Vec::new(),
            base_revision: 0,
        }
    }

    /// Add a change to the log
    pub fn push(&mut self, change: RecordChange) {
        self.changes.push(change);
    }

    /// Current revision (total number of changes recorded so far)
    pub fn revision(&self) -> u64 {
        self.base_revision + self.changes.len() as u64
    }

    /// Returns true if there are no retained changes
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns the number of retained changes
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Changes recorded after `revision`.
    ///
    /// Returns `None` when some of those changes have already been compacted
    /// away; the caller must then treat the collection as replaced.
    pub fn changes_since(&self, revision: u64) -> Option<&[RecordChange]> {
        if revision < self.base_revision {
            return None;
        }
        let offset = (revision - self.base_revision) as usize;
        Some(self.changes.get(offset..).unwrap_or(&[]))
    }

    /// Drop every change at or before `revision`
    pub fn compact(&mut self, revision: u64) {
        if revision <= self.base_revision {
            return;
        }
        let drop = ((revision - self.base_revision) as usize).min(self.changes.len());
        self.changes.drain(..drop);
        self.base_revision += drop as u64;
    }

    /// Drop all retained changes, keeping the revision
    pub fn clear(&mut self) {
        self.base_revision = self.revision();
        self.changes.clear();
    }
}
