/// Persisted queue state for one session
use super::track::QueueEntry;
use serde::{Deserialize, Serialize};

/// Serialized queue and position, written on orderly shutdown
///
/// Requesters are stored as stable user ids only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub current_index: usize,
    pub queue: Vec<QueueEntry>,
}

impl SessionSnapshot {
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Whether the stored position points into the stored queue
    pub fn is_consistent(&self) -> bool {
        self.queue.is_empty() || self.current_index < self.queue.len()
    }
}
