//! Shuffle history tracking
//!
//! Remembers which track ids shuffle has already visited so it can avoid
//! picking them again until the whole queue has been covered.

use std::collections::VecDeque;

/// Recently played track ids, oldest first
#[derive(Debug, Clone, Default)]
pub struct ShuffleHistory {
    ids: VecDeque<String>,
}

impl ShuffleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a played id (no-op if already present)
    pub fn record(&mut self, id: &str) {
        if !self.contains(id) {
            self.ids.push_back(id.to_string());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|seen| seen == id)
    }

    /// Forget everything except `id`
    pub fn reset_to(&mut self, id: &str) {
        self.ids.clear();
        self.ids.push_back(id.to_string());
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// All ids (oldest first)
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}
