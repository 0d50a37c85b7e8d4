//! Core types for playback management

use chorus_core::types::SessionConfig;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Player state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    /// No voice connection (queue may still hold tracks)
    Idle,

    /// Connected, nothing streaming
    Connected,

    /// Streaming a track
    Playing,

    /// Stream paused
    Paused,
}

/// Details of the track at the current position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlayingView {
    /// 1-based queue position
    pub position: usize,
    pub title: String,
    pub page_url: String,
    pub uploader_name: Option<String>,
    pub upload_date: Option<NaiveDate>,
    pub duration_seconds: Option<u64>,
    pub view_count: Option<u64>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub requester: Option<String>,
    pub config: SessionConfig,
}

/// One line of the queue listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueLine {
    /// 1-based queue position
    pub position: usize,
    pub title: String,
    pub page_url: String,
    pub duration_seconds: Option<u64>,
    pub requester: Option<String>,
    pub is_current: bool,
}

/// Read-only projection of a session queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueView {
    pub lines: Vec<QueueLine>,
    /// Sum of known durations
    pub total_duration_seconds: u64,
    pub config: SessionConfig,
}

impl QueueView {
    /// Lines shown per page
    pub const PAGE_SIZE: usize = 10;

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn page_count(&self) -> usize {
        self.lines.len().div_ceil(Self::PAGE_SIZE)
    }

    /// Lines on a 0-based page (empty past the end)
    pub fn page(&self, page: usize) -> &[QueueLine] {
        self.lines
            .chunks(Self::PAGE_SIZE)
            .nth(page)
            .unwrap_or_default()
    }
}
