/// Track types: fully resolved tracks, playlist stubs and queue entries
use super::user::Requester;
use crate::link;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of description lines kept
pub const DESCRIPTION_MAX_LINES: usize = 15;

/// Maximum description length in characters
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// Line appended when a description was truncated
pub const DESCRIPTION_ELLIPSIS: &str = "...";

/// A resolved media item with a streamable address
///
/// Immutable once resolved, except for the stream address and its expiry
/// which are replaced in place when the link is refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Resolver-stable identifier
    pub id: String,
    pub title: String,
    /// Summarised description (see [`summarize_description`])
    pub description: String,
    pub uploader_name: Option<String>,
    /// Some sources omit the duration
    pub duration_seconds: Option<u64>,
    pub thumbnail_url: Option<String>,
    stream_address: String,
    stream_expires_at: Option<DateTime<Utc>>,
    pub page_url: String,
    pub view_count: Option<u64>,
    pub upload_date: Option<NaiveDate>,
    #[serde(default)]
    pub requested_by: Option<Requester>,
}

impl Track {
    /// Create a track from its id, title and stream address
    ///
    /// The expiry is derived from the address.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        stream_address: impl Into<String>,
    ) -> Self {
        let stream_address = stream_address.into();
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            uploader_name: None,
            duration_seconds: None,
            thumbnail_url: None,
            stream_expires_at: link::expires_at(&stream_address),
            stream_address,
            page_url: String::new(),
            view_count: None,
            upload_date: None,
            requested_by: None,
        }
    }

    /// Set the description, summarising it on the way in
    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = summarize_description(description);
        self
    }

    #[must_use]
    pub fn with_duration(mut self, seconds: u64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    #[must_use]
    pub fn with_page_url(mut self, url: impl Into<String>) -> Self {
        self.page_url = url.into();
        self
    }

    pub fn stream_address(&self) -> &str {
        &self.stream_address
    }

    pub fn stream_expires_at(&self) -> Option<DateTime<Utc>> {
        self.stream_expires_at
    }

    /// Replace the stream address after a link refresh
    pub fn refresh_stream(&mut self, stream_address: impl Into<String>) {
        self.stream_address = stream_address.into();
        self.stream_expires_at = link::expires_at(&self.stream_address);
    }

    /// Stub pointing back at this track, used to re-resolve an expired link
    pub fn to_stub(&self) -> TrackStub {
        TrackStub {
            id: self.id.clone(),
            title: self.title.clone(),
            page_url: self.page_url.clone(),
            duration_seconds: self.duration_seconds,
            requested_by: self.requested_by.clone(),
        }
    }
}

/// A partially resolved track lacking a stream address
///
/// Typical of playlist listings and related-video searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackStub {
    pub id: String,
    pub title: String,
    pub page_url: String,
    pub duration_seconds: Option<u64>,
    #[serde(default)]
    pub requested_by: Option<Requester>,
}

impl TrackStub {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            page_url: String::new(),
            duration_seconds: None,
            requested_by: None,
        }
    }
}

/// One queue slot: either a stub awaiting lazy resolution or a resolved track
///
/// Keeping the two apart means an unresolved stream address can never be
/// handed to the transport by accident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueueEntry {
    Stub(TrackStub),
    Resolved(Track),
}

impl QueueEntry {
    pub fn id(&self) -> &str {
        match self {
            Self::Stub(stub) => &stub.id,
            Self::Resolved(track) => &track.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Stub(stub) => &stub.title,
            Self::Resolved(track) => &track.title,
        }
    }

    pub fn page_url(&self) -> &str {
        match self {
            Self::Stub(stub) => &stub.page_url,
            Self::Resolved(track) => &track.page_url,
        }
    }

    pub fn duration_seconds(&self) -> Option<u64> {
        match self {
            Self::Stub(stub) => stub.duration_seconds,
            Self::Resolved(track) => track.duration_seconds,
        }
    }

    pub fn requested_by(&self) -> Option<&Requester> {
        match self {
            Self::Stub(stub) => stub.requested_by.as_ref(),
            Self::Resolved(track) => track.requested_by.as_ref(),
        }
    }

    pub fn set_requested_by(&mut self, requester: Option<Requester>) {
        match self {
            Self::Stub(stub) => stub.requested_by = requester,
            Self::Resolved(track) => track.requested_by = requester,
        }
    }

    pub fn as_resolved(&self) -> Option<&Track> {
        match self {
            Self::Resolved(track) => Some(track),
            Self::Stub(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

impl From<Track> for QueueEntry {
    fn from(track: Track) -> Self {
        Self::Resolved(track)
    }
}

impl From<TrackStub> for QueueEntry {
    fn from(stub: TrackStub) -> Self {
        Self::Stub(stub)
    }
}

/// Trim a description to at most 15 lines and 1000 characters
///
/// Whole lines are dropped from the end; a trailing `...` line marks that
/// something was cut.
pub fn summarize_description(description: &str) -> String {
    let all_lines: Vec<&str> = description.split('\n').collect();
    let mut kept: Vec<&str> = all_lines.iter().take(DESCRIPTION_MAX_LINES).copied().collect();

    while kept.join("\n").chars().count() > DESCRIPTION_MAX_CHARS {
        kept.pop();
    }

    let truncated = kept.len() != all_lines.len();
    let mut summary = kept.join("\n");
    if truncated {
        if !kept.is_empty() {
            summary.push('\n');
        }
        summary.push_str(DESCRIPTION_ELLIPSIS);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_description_untouched() {
        assert_eq!(summarize_description("one\ntwo"), "one\ntwo");
        assert_eq!(summarize_description(""), "");
    }

    #[test]
    fn keeps_at_most_fifteen_lines() {
        let text: Vec<String> = (0..20).map(|i| format!("line {i}")).collect();
        let summary = summarize_description(&text.join("\n"));
        let lines: Vec<&str> = summary.lines().collect();

        assert_eq!(lines.len(), DESCRIPTION_MAX_LINES + 1);
        assert_eq!(lines[14], "line 14");
        assert_eq!(lines[15], DESCRIPTION_ELLIPSIS);
    }

    #[test]
    fn drops_lines_until_under_limit() {
        let long_line = "x".repeat(400);
        let text = [long_line.as_str(), long_line.as_str(), long_line.as_str()].join("\n");
        let summary = summarize_description(&text);

        assert!(summary.ends_with("\n..."));
        let body = summary.trim_end_matches("\n...");
        assert!(body.chars().count() <= DESCRIPTION_MAX_CHARS);
        assert_eq!(body.lines().count(), 2);
    }

    #[test]
    fn refresh_replaces_address_and_expiry() {
        let mut track = Track::new("a", "A", "https://cdn.example/a?expire=100");
        assert_eq!(track.stream_expires_at().map(|t| t.timestamp()), Some(100));

        track.refresh_stream("https://cdn.example/a?expire=5000");
        assert_eq!(track.stream_address(), "https://cdn.example/a?expire=5000");
        assert_eq!(track.stream_expires_at().map(|t| t.timestamp()), Some(5000));
    }

    #[test]
    fn queue_entry_snapshot_is_tagged() {
        let entry = QueueEntry::from(TrackStub::new("abc", "Stubbed"));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "stub");
        assert_eq!(json["id"], "abc");
        assert!(!entry.is_resolved());
    }
}
