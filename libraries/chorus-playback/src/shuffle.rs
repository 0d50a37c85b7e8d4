//! Shuffle selection
//!
//! Picks the next queue index uniformly at random while steering clear of
//! ids recorded in the shuffle history. History is reset to just the current
//! track once it covers every distinct id in the queue, or after too many
//! draws land on already-played tracks.

use crate::history::ShuffleHistory;
use crate::queue::Queue;
use rand::seq::SliceRandom;
use rand::Rng;

/// Random draws attempted before the history is forcibly reset
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Choose the next index to play
///
/// Returns `None` only for an empty queue.
pub fn pick_next<R: Rng + ?Sized>(
    queue: &Queue,
    history: &mut ShuffleHistory,
    max_attempts: usize,
    rng: &mut R,
) -> Option<usize> {
    if queue.is_empty() {
        return None;
    }

    let current_id = queue.current().map(|entry| entry.id().to_string());
    if let Some(id) = &current_id {
        history.record(id);
    }

    if history.len() >= queue.distinct_ids() {
        reset(history, current_id.as_deref());
    }

    for _ in 0..max_attempts {
        let index = rng.gen_range(0..queue.len());
        if queue.len() <= 1 || !played(queue, history, index) {
            return Some(index);
        }
    }

    reset(history, current_id.as_deref());
    let fresh: Vec<usize> = (0..queue.len())
        .filter(|&index| !played(queue, history, index))
        .collect();

    // Only one distinct id left: any slot is as good as another.
    Some(
        fresh
            .choose(rng)
            .copied()
            .unwrap_or_else(|| rng.gen_range(0..queue.len())),
    )
}

fn played(queue: &Queue, history: &ShuffleHistory, index: usize) -> bool {
    queue
        .get(index)
        .is_some_and(|entry| history.contains(entry.id()))
}

fn reset(history: &mut ShuffleHistory, current_id: Option<&str>) {
    match current_id {
        Some(id) => history.reset_to(id),
        None => history.clear(),
    }
}
