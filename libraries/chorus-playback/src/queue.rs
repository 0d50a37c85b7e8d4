//! Session queue
//!
//! Insertion order is play order and duplicate ids are allowed. The queue
//! owns the current position so removal arithmetic stays in one place.

use chorus_core::types::{QueueEntry, SessionSnapshot};

/// Where a removed entry sat relative to the current position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Before the current entry; the position was shifted down by one
    BeforeCurrent,

    /// The current entry itself; the position now names its successor
    /// (or equals `len()` if it was the last one)
    Current,

    /// After the current entry; the position is unchanged
    AfterCurrent,
}

/// Ordered track queue with a current position
#[derive(Debug, Clone, Default)]
pub struct Queue {
    entries: Vec<QueueEntry>,
    current: usize,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a queue from a persisted snapshot
    ///
    /// A position that no longer points into the queue is reset to 0.
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        let current = if snapshot.is_consistent() {
            snapshot.current_index
        } else {
            0
        };
        Self {
            entries: snapshot.queue,
            current,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_index: self.current,
            queue: self.entries.clone(),
        }
    }

    /// Append an entry to the end of the queue
    pub fn push(&mut self, entry: QueueEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Move the position without bounds checking
    ///
    /// Callers may park the position at `len()` transiently while deciding
    /// where to go next; it must be valid again before the operation ends.
    pub fn set_current(&mut self, index: usize) {
        self.current = index;
    }

    /// Entry at the current position
    pub fn current(&self) -> Option<&QueueEntry> {
        self.entries.get(self.current)
    }

    pub fn get(&self, index: usize) -> Option<&QueueEntry> {
        self.entries.get(index)
    }

    /// Swap the entry at `index` for a newly resolved one
    pub fn replace(&mut self, index: usize, entry: QueueEntry) -> Option<QueueEntry> {
        self.entries
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, entry))
    }

    /// Whether the position is on the last entry
    pub fn is_last(&self) -> bool {
        !self.entries.is_empty() && self.current == self.entries.len() - 1
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id() == id)
    }

    /// Number of distinct track ids in the queue
    pub fn distinct_ids(&self) -> usize {
        let mut ids: Vec<&str> = self.entries.iter().map(QueueEntry::id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Remove the entry at `index`, keeping the position on the same logical track
    pub fn remove(&mut self, index: usize) -> Option<(QueueEntry, Removal)> {
        if index >= self.entries.len() {
            return None;
        }

        let entry = self.entries.remove(index);
        let removal = match index.cmp(&self.current) {
            std::cmp::Ordering::Less => {
                self.current -= 1;
                Removal::BeforeCurrent
            }
            std::cmp::Ordering::Equal => Removal::Current,
            std::cmp::Ordering::Greater => Removal::AfterCurrent,
        };

        Some((entry, removal))
    }

    /// Clear entire queue and rewind
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }
}
