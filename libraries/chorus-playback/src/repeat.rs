//! Repeat policy
//!
//! Evaluated last, after shuffle and autoplay declined to pick a track.

use crate::queue::Queue;
use chorus_core::types::RepeatMode;

/// Advance the queue position according to `mode`
///
/// Returns `true` if a track should be played at the new position. At the
/// end of the queue with repeat off the position rewinds to 0 and `false`
/// is returned so playback stops.
pub fn advance(queue: &mut Queue, mode: RepeatMode) -> bool {
    if queue.is_empty() {
        return false;
    }

    let is_last = queue.is_last();
    match mode {
        RepeatMode::All if is_last => queue.set_current(0),
        RepeatMode::Off if is_last => {
            queue.set_current(0);
            return false;
        }
        RepeatMode::Single => {}
        RepeatMode::Off | RepeatMode::All => queue.set_current(queue.current_index() + 1),
    }

    true
}
