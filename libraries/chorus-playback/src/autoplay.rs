//! Autoplay candidate selection
//!
//! When the last queued track finishes, autoplay extends the queue with a
//! related track that is not already queued.

use crate::options::PlayerOptions;
use crate::queue::Queue;
use chorus_core::types::{RepeatMode, SessionConfig, TrackStub};

/// Whether autoplay should be consulted for the current position
pub fn applies(config: &SessionConfig, options: &PlayerOptions, queue: &Queue) -> bool {
    if !config.autoplay || !queue.is_last() {
        return false;
    }
    config.repeat != RepeatMode::All || options.autoplay_under_repeat_all
}

/// First related candidate whose id is not in the queue yet
pub fn first_new_candidate(queue: &Queue, candidates: Vec<TrackStub>) -> Option<TrackStub> {
    candidates
        .into_iter()
        .find(|candidate| !queue.contains_id(&candidate.id))
}
