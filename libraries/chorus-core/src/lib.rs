//! Chorus Core
//!
//! Shared types, collaborator traits and error handling for Chorus, a
//! per-channel audio playback session engine for chat applications.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `TrackStub`, `QueueEntry`, `SessionConfig`, ids
//! - **Collaborator Traits**: `TrackResolver`, `VoiceTransport`, `Notifier`,
//!   `SettingsStore`, `SnapshotStore`, `UserDirectory`
//! - **Link Expiry**: time-limited stream address handling
//! - **Error Handling**: Unified `ChorusError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use chorus_core::types::{QueueEntry, Track, TrackStub};
//!
//! let track = Track::new("dQw4", "Some Song", "https://cdn.example/a?expire=1700000000");
//! assert!(track.stream_expires_at().is_some());
//!
//! let entry = QueueEntry::from(TrackStub::new("x1", "Listed Song"));
//! assert!(!entry.is_resolved());
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod link;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{ChorusError, Result};
pub use traits::{
    Notifier, Resolution, SettingsStore, SnapshotStore, TrackResolver, UserDirectory,
    VoiceTransport,
};
pub use types::{
    ChannelId, CompletionOutcome, CompletionSender, ConfigUpdate, ConnectionHandle, MessageId,
    Notice, PlaybackCompletion, QueueEntry, Requester, RepeatMode, SessionConfig, SessionId,
    SessionSnapshot, Track, TrackNotice, TrackStub, UserId, UserProfile, Volume,
};
