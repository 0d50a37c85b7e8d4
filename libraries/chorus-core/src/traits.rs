/// Collaborator traits for Chorus
///
/// The player owns session state; everything that talks to the outside world
/// (media extraction, the voice gateway, chat messages, storage) sits behind
/// one of these traits.
use crate::error::Result;
use crate::link;
use crate::types::{
    ChannelId, ConfigUpdate, ConnectionHandle, MessageId, Notice, PlaybackCompletion,
    SessionConfig, SessionId, SessionSnapshot, Track, TrackStub, UserId, UserProfile,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Result of resolving a query or URL
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A single, fully resolved track
    Track(Track),

    /// A listing (playlist) of stubs resolved lazily at play time
    Playlist(Vec<TrackStub>),
}

/// Turns queries and URLs into tracks and refreshes stream addresses
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Resolve a search keyword or URL
    ///
    /// # Errors
    /// Returns `ChorusError::Resolution` if nothing matched
    async fn resolve(&self, query: &str) -> Result<Resolution>;

    /// Fill in the stream address and full metadata for a stub
    ///
    /// # Errors
    /// Returns `ChorusError::NotAvailable` if the source rejects or rate-limits the request
    async fn materialize(&self, stub: &TrackStub) -> Result<Track>;

    /// Videos related to `track_id`, most relevant first
    async fn related_to(&self, track_id: &str) -> Result<Vec<TrackStub>>;

    /// Whether a stream address must be refreshed before use at `now`
    fn is_expired(&self, stream_address: &str, now: DateTime<Utc>) -> bool {
        link::is_expired(stream_address, now)
    }
}

/// Live audio connection for a session
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    /// Join a voice channel
    async fn connect(&self, channel: &ChannelId) -> Result<ConnectionHandle>;

    /// Start streaming `stream_address` at `volume` (linear gain 0.0-1.0)
    ///
    /// The returned completion resolves when the stream ends.
    async fn play(
        &self,
        handle: &ConnectionHandle,
        stream_address: &str,
        volume: f32,
    ) -> Result<PlaybackCompletion>;

    /// Change the gain of the active stream
    async fn set_volume(&self, handle: &ConnectionHandle, volume: f32) -> Result<()>;

    async fn pause(&self, handle: &ConnectionHandle) -> Result<()>;

    async fn resume(&self, handle: &ConnectionHandle) -> Result<()>;

    /// Stop the active stream without leaving the channel
    async fn stop(&self, handle: &ConnectionHandle) -> Result<()>;

    async fn disconnect(&self, handle: &ConnectionHandle) -> Result<()>;

    fn is_playing(&self, handle: &ConnectionHandle) -> bool;

    fn is_paused(&self, handle: &ConnectionHandle) -> bool;
}

/// Sends, and later deletes, status messages for a session
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a notice; `delete_after` asks the notifier to remove it later
    async fn send(
        &self,
        session: &SessionId,
        notice: Notice,
        delete_after: Option<Duration>,
    ) -> Result<MessageId>;

    /// Delete a previously sent notice
    async fn delete(&self, session: &SessionId, message: &MessageId) -> Result<()>;
}

/// Per-session configuration store
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Current configuration, defaults if the session has none stored
    async fn load(&self, session: &SessionId) -> Result<SessionConfig>;

    /// Persist one key
    async fn update(&self, session: &SessionId, update: ConfigUpdate) -> Result<()>;
}

/// Durable queue snapshots kept across restarts
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read every stored snapshot and discard the backing copy
    async fn take_all(&self) -> Result<HashMap<SessionId, SessionSnapshot>>;

    /// Persist snapshots for all given sessions
    async fn save_all(&self, snapshots: &HashMap<SessionId, SessionSnapshot>) -> Result<()>;
}

/// Maps stable user ids back to live identities
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn lookup(&self, id: &UserId) -> Option<UserProfile>;

    /// Identity used for tracks queued by the system (autoplay)
    fn system_user(&self) -> UserProfile;
}
