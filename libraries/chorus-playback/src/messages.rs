//! Transient notice handles kept by a player

use chorus_core::types::MessageId;

/// Which transient notice a handle belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageSlot {
    LastPlaying,
    LastFinished,
    Paused,
    AutoPaused,
}

impl MessageSlot {
    pub const ALL: [MessageSlot; 4] = [
        MessageSlot::LastPlaying,
        MessageSlot::LastFinished,
        MessageSlot::Paused,
        MessageSlot::AutoPaused,
    ];
}

/// Handles to previously sent notices, each deleted before it is replaced
#[derive(Debug, Clone, Default)]
pub struct TransientMessages {
    last_playing: Option<MessageId>,
    last_finished: Option<MessageId>,
    paused: Option<MessageId>,
    auto_paused: Option<MessageId>,
}

impl TransientMessages {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, slot: MessageSlot) -> &mut Option<MessageId> {
        match slot {
            MessageSlot::LastPlaying => &mut self.last_playing,
            MessageSlot::LastFinished => &mut self.last_finished,
            MessageSlot::Paused => &mut self.paused,
            MessageSlot::AutoPaused => &mut self.auto_paused,
        }
    }

    pub fn get(&self, slot: MessageSlot) -> Option<&MessageId> {
        match slot {
            MessageSlot::LastPlaying => self.last_playing.as_ref(),
            MessageSlot::LastFinished => self.last_finished.as_ref(),
            MessageSlot::Paused => self.paused.as_ref(),
            MessageSlot::AutoPaused => self.auto_paused.as_ref(),
        }
    }

    /// Remove and return the handle in `slot`
    pub fn take(&mut self, slot: MessageSlot) -> Option<MessageId> {
        self.slot_mut(slot).take()
    }

    /// Store a new handle, returning the one it replaces
    pub fn set(&mut self, slot: MessageSlot, message: MessageId) -> Option<MessageId> {
        self.slot_mut(slot).replace(message)
    }

    pub fn is_empty(&self) -> bool {
        MessageSlot::ALL.iter().all(|slot| self.get(*slot).is_none())
    }
}
