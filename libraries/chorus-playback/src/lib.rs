//! Chorus - Playback Sessions
//!
//! Per-channel playback session engine for chat applications.
//!
//! This crate provides:
//! - The per-session `Player` state machine (enqueue, play, next, removal)
//! - Queue policies: shuffle (with history), autoplay, repeat (off/single/all)
//! - Stream link refresh before playback
//! - A cancelable inactivity watchdog
//! - The `SessionRegistry` (one player per session, snapshot restore/save)
//! - A command surface (`Command`, `Dispatcher`) for the dispatch layer
//!
//! # Architecture
//!
//! `chorus-playback` talks to the outside world only through the traits in
//! `chorus-core`:
//! - `TrackResolver` turns queries into tracks and refreshes stream links
//! - `VoiceTransport` streams audio and reports completion
//! - `Notifier` posts and deletes status notices
//! - `SettingsStore` and `SnapshotStore` persist configuration and queues
//!
//! Each player lives behind its own `tokio::sync::Mutex`. Stream completions
//! and watchdog firings lock the same mutex, so they are serialised with user
//! commands and dropped when a newer command made them stale.
//!
//! # Example: Queue policies
//!
//! ```rust
//! use chorus_core::types::{RepeatMode, TrackStub};
//! use chorus_playback::{repeat, Queue};
//!
//! let mut queue = Queue::new();
//! for id in ["a", "b", "c"] {
//!     queue.push(TrackStub::new(id, id).into());
//! }
//! queue.set_current(2);
//!
//! // Last track with repeat off: rewind and stop.
//! assert!(!repeat::advance(&mut queue, RepeatMode::Off));
//! assert_eq!(queue.current_index(), 0);
//! ```
//!
//! # Example: Commands
//!
//! ```rust,no_run
//! use chorus_playback::{Command, CommandContext, Dispatcher, SessionRegistry};
//! # async fn run(dispatcher: Dispatcher, ctx: CommandContext) {
//! let command = Command::parse("volume", "55%").unwrap();
//! let reply = dispatcher.execute(&ctx, command).await;
//! # }
//! ```

pub mod autoplay;
mod commands;
mod error;
mod history;
mod messages;
mod options;
mod player;
mod queue;
mod registry;
pub mod repeat;
pub mod shuffle;
pub mod types;
mod watchdog;

// Public exports
pub use commands::{
    playlist_entries, Command, CommandContext, Dispatcher, PlayRequest, Reply,
    DELETED_VIDEO_TITLE, WATCH_URL_PREFIX,
};
pub use error::{CommandError, PlaybackError, Result};
pub use history::ShuffleHistory;
pub use messages::{MessageSlot, TransientMessages};
pub use options::PlayerOptions;
pub use player::{Player, PlayerDeps, SharedPlayer, PLAYBACK_FAILED_MESSAGE};
pub use queue::{Queue, Removal};
pub use registry::SessionRegistry;
pub use types::{NowPlayingView, PlayerState, QueueLine, QueueView};
pub use watchdog::Watchdog;
