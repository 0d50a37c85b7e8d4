/// Status notices the player hands to the notifier
///
/// The player decides *what* happened; rendering is the notifier's job.
use super::config::SessionConfig;
use serde::{Deserialize, Serialize};

/// Track details attached to track-related notices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackNotice {
    /// 1-based queue position
    pub position: usize,
    pub title: String,
    pub page_url: String,
    pub duration_seconds: Option<u64>,
    /// Display name of the requester, if known
    pub requester: Option<String>,
    pub config: SessionConfig,
}

/// A notice sent to a session's chat channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Notice {
    NowPlaying(TrackNotice),
    Finished(TrackNotice),
    Removed(TrackNotice),
    Paused,
    AutoPaused,
    Resumed,
    Stopped,
    Reset,
    TimeoutReset,
    /// Transport refused to start a stream
    PlaybackFailed(String),
    /// Resolver could not produce the next track
    ResolutionFailed(String),
    Info(String),
}

impl Notice {
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }
}
