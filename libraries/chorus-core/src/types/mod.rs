mod config;
mod ids;
mod notice;
mod snapshot;
mod track;
mod transport;
mod user;

pub use config::{ConfigUpdate, RepeatMode, SessionConfig, Volume};
pub use ids::{ChannelId, MessageId, SessionId, UserId};
pub use notice::{Notice, TrackNotice};
pub use snapshot::SessionSnapshot;
pub use track::{
    summarize_description, QueueEntry, Track, TrackStub, DESCRIPTION_ELLIPSIS,
    DESCRIPTION_MAX_CHARS, DESCRIPTION_MAX_LINES,
};
pub use transport::{CompletionOutcome, CompletionSender, ConnectionHandle, PlaybackCompletion};
pub use user::{Requester, UserProfile};
