//! Command surface for the dispatch layer
//!
//! Parses command names and argument strings, checks voice-channel
//! membership and maps each command onto one player operation. Positions
//! are 1-based here and 0-based inside the player.

use crate::error::CommandError;
use crate::player::Player;
use crate::registry::SessionRegistry;
use crate::types::{NowPlayingView, QueueView};
use chorus_core::{
    ChannelId, ConfigUpdate, QueueEntry, Requester, RepeatMode, Resolution, SessionId, TrackStub,
    UserProfile, Volume,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;

/// Listing title of entries removed from their playlist
pub const DELETED_VIDEO_TITLE: &str = "[Deleted video]";

/// Page URL prefix for listing entries that carry none
pub const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// What `play` was asked to play
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayRequest {
    /// 1-based queue position
    Index(usize),

    /// Search keyword or URL
    Query(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play(PlayRequest),
    Skip,
    Stop,
    Pause,
    Resume,
    Reset,
    /// 1-based queue position
    RemoveSong(usize),
    /// `None` asks for the current value
    Volume(Option<Volume>),
    /// `None` asks for the current value
    Repeat(Option<RepeatMode>),
    Autoplay,
    Shuffle,
    NowPlaying,
    /// 0-based page of the listing
    Playlist(usize),
}

impl Command {
    /// Parse a command name (or alias) and its raw argument string
    pub fn parse(name: &str, args: &str) -> Result<Self, CommandError> {
        let args = args.trim();
        let command = match name.to_ascii_lowercase().as_str() {
            "play" | "p" => {
                if args.is_empty() {
                    return Err(CommandError::MissingArgument("url, keyword or index"));
                }
                if args.chars().all(|c| c.is_ascii_digit()) {
                    Command::Play(PlayRequest::Index(parse_position(args)?))
                } else {
                    Command::Play(PlayRequest::Query(args.to_string()))
                }
            }
            "skip" | "next" => Command::Skip,
            "stop" => Command::Stop,
            "pause" => Command::Pause,
            "resume" => Command::Resume,
            "reset" => Command::Reset,
            "removesong" => {
                if args.is_empty() {
                    return Err(CommandError::MissingArgument("index"));
                }
                Command::RemoveSong(parse_position(args)?)
            }
            "volume" | "vol" => {
                if args.is_empty() {
                    Command::Volume(None)
                } else {
                    let volume = args
                        .parse::<Volume>()
                        .map_err(|_| CommandError::InvalidVolume(args.to_string()))?;
                    Command::Volume(Some(volume))
                }
            }
            "repeat" => {
                if args.is_empty() {
                    Command::Repeat(None)
                } else {
                    let mode = args
                        .parse::<RepeatMode>()
                        .map_err(|_| CommandError::InvalidRepeat(args.to_string()))?;
                    Command::Repeat(Some(mode))
                }
            }
            "autoplay" => Command::Autoplay,
            "shuffle" => Command::Shuffle,
            "nowplaying" | "np" => Command::NowPlaying,
            "playlist" | "list" => {
                let page = if args.is_empty() {
                    0
                } else {
                    parse_position(args)? - 1
                };
                Command::Playlist(page)
            }
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }

    /// Whether the caller must share the session's voice channel
    pub fn requires_voice(&self) -> bool {
        !matches!(self, Command::NowPlaying | Command::Playlist(_))
    }
}

fn parse_position(args: &str) -> Result<usize, CommandError> {
    match args.parse::<usize>() {
        Ok(position) if position > 0 => Ok(position),
        _ => Err(CommandError::InvalidIndex),
    }
}

/// Who issued a command, and from where
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub session: SessionId,
    pub user: UserProfile,
    /// Voice channel the caller is currently in
    pub voice_channel: Option<ChannelId>,
    /// Owners and administrators may force a reset from anywhere
    pub is_admin: bool,
}

/// What the dispatch layer should show in response
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The player already posted its own notice
    None,
    Text {
        text: String,
        delete_after: Option<Duration>,
    },
    NowPlaying(NowPlayingView),
    Queue {
        view: QueueView,
        page: usize,
    },
}

impl Reply {
    fn transient(text: impl Into<String>, ttl: Duration) -> Self {
        Reply::Text {
            text: text.into(),
            delete_after: Some(ttl),
        }
    }
}

pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Run one command for the caller in `ctx`
    pub async fn execute(
        &self,
        ctx: &CommandContext,
        command: Command,
    ) -> Result<Reply, CommandError> {
        tracing::debug!(session = %ctx.session, user = %ctx.user.id, ?command, "Executing command");

        match &command {
            Command::NowPlaying => return self.now_playing(&ctx.session).await,
            Command::Playlist(page) => return self.playlist(&ctx.session, *page).await,
            Command::Reset => return self.reset(ctx).await,
            Command::Play(PlayRequest::Query(query)) => return self.play_query(ctx, query).await,
            _ => {}
        }

        let ttl = self.registry.options().finished_notice_ttl();
        let mut player = self.live_player(&ctx.session).await;
        let channel = check_membership(ctx, player.voice_channel())?.clone();

        let reply = match command {
            Command::Play(PlayRequest::Index(position)) => {
                if position > player.queue().len() {
                    return Err(CommandError::InvalidIndex);
                }
                player.connect(&channel).await?;
                if let Err(e) = player.next(Some(position - 1), false).await {
                    // Already reported to the session by the player.
                    tracing::warn!(session = %ctx.session, position, "Play by index failed: {}", e);
                }
                Reply::None
            }
            Command::Skip => {
                player.skip().await?;
                Reply::None
            }
            Command::Stop => {
                player.stop().await?;
                tracing::info!(session = %ctx.session, "Player stopped");
                Reply::transient("Player stopped.", ttl)
            }
            Command::Pause => {
                player.pause().await?;
                Reply::None
            }
            Command::Resume => {
                player.resume().await?;
                Reply::None
            }
            Command::RemoveSong(position) => {
                if position > player.queue().len() {
                    return Err(CommandError::InvalidIndex);
                }
                player.remove_at(position - 1).await?;
                Reply::None
            }
            Command::Volume(None) => {
                Reply::transient(format!("Volume is set to {}.", player.config().volume), ttl)
            }
            Command::Volume(Some(volume)) => {
                let config = player.update_config(ConfigUpdate::Volume(volume)).await?;
                Reply::transient(format!("Volume changed to {}", config.volume), ttl)
            }
            Command::Repeat(None) => {
                Reply::transient(format!("Repeat is set to {}.", player.config().repeat), ttl)
            }
            Command::Repeat(Some(mode)) => {
                let config = player.update_config(ConfigUpdate::Repeat(mode)).await?;
                Reply::transient(format!("Repeat changed to {}.", config.repeat), ttl)
            }
            Command::Autoplay => {
                let enabled = !player.config().autoplay;
                let config = player.update_config(ConfigUpdate::Autoplay(enabled)).await?;
                Reply::transient(
                    format!("Autoplay is set to {}.", enabled_label(config.autoplay)),
                    ttl,
                )
            }
            Command::Shuffle => {
                let enabled = !player.config().shuffle;
                let config = player.update_config(ConfigUpdate::Shuffle(enabled)).await?;
                Reply::transient(
                    format!("Shuffle is set to {}.", enabled_label(config.shuffle)),
                    ttl,
                )
            }
            Command::Play(PlayRequest::Query(_))
            | Command::Reset
            | Command::NowPlaying
            | Command::Playlist(_) => Reply::None,
        };
        Ok(reply)
    }

    /// React to the number of listeners left in a session's voice channel
    ///
    /// An empty channel auto-pauses the player (arming the inactivity
    /// watchdog); the first listener back resumes it.
    pub async fn listeners_changed(&self, session: &SessionId, listeners: usize) {
        let Some(shared) = self.registry.get(session).await else {
            return;
        };
        let mut player = shared.lock().await;
        if !player.is_connected() {
            return;
        }

        let result = if listeners == 0 {
            player.auto_pause().await
        } else if player.is_auto_paused() {
            player.auto_resume().await
        } else {
            Ok(())
        };

        if let Err(e) = result {
            tracing::warn!(session = %session, "Failed to react to listener change: {}", e);
        }
    }

    async fn play_query(&self, ctx: &CommandContext, query: &str) -> Result<Reply, CommandError> {
        let ttl = self.registry.options().finished_notice_ttl();
        {
            let player = self.live_player(&ctx.session).await;
            check_membership(ctx, player.voice_channel())?;
        }

        // Resolve without holding the player so completions keep flowing.
        let resolution = match self.registry.deps().resolver.resolve(query).await {
            Ok(resolution) => resolution,
            Err(e) if e.is_resolution() => {
                tracing::info!(session = %ctx.session, query, "Song failed to load: {}", e);
                return Ok(Reply::transient("Song failed to load.", ttl));
            }
            Err(e) => return Err(e.into()),
        };

        // The session may have been reset or joined elsewhere meanwhile.
        let mut player = self.live_player(&ctx.session).await;
        let channel = check_membership(ctx, player.voice_channel())?.clone();
        let (entries, text) = match resolution {
            Resolution::Track(track) => {
                let text = format!(
                    "Added song to queue #{}: {}",
                    player.queue().len() + 1,
                    track.title
                );
                (vec![QueueEntry::from(track)], text)
            }
            Resolution::Playlist(stubs) => {
                let entries = playlist_entries(stubs);
                let text = format!("Added {}.", plural(entries.len(), "song", "songs"));
                (entries, text)
            }
        };

        player.enqueue(entries, &Requester::resolved(ctx.user.clone()));
        start_if_idle(&mut player, &channel).await?;
        Ok(Reply::transient(text, ttl))
    }

    async fn reset(&self, ctx: &CommandContext) -> Result<Reply, CommandError> {
        let ttl = self.registry.options().finished_notice_ttl();
        if let Some(shared) = self.registry.get(&ctx.session).await {
            let mut player = shared.lock().await;
            if !player.is_retired() {
                if !ctx.is_admin {
                    check_membership(ctx, player.voice_channel())?;
                }
                if let Err(e) = player.reset().await {
                    tracing::warn!(session = %ctx.session, "Reset finished with error: {}", e);
                }
                // Unregister before anyone else can lock this player again.
                player.retire();
                self.registry.remove_player(&ctx.session, &shared).await;
            }
        }

        Ok(Reply::transient("Player reset.", ttl))
    }

    /// Lock the session's registered player
    ///
    /// A player retired by a concurrent reset is already unregistered by the
    /// time its lock is released, so the next lookup yields a fresh one.
    async fn live_player(&self, session: &SessionId) -> OwnedMutexGuard<Player> {
        loop {
            let player = self.registry.get_or_create(session).await.lock_owned().await;
            if !player.is_retired() {
                return player;
            }
            tracing::debug!(session = %session, "Skipping retired player");
        }
    }

    async fn now_playing(&self, session: &SessionId) -> Result<Reply, CommandError> {
        let view = match self.registry.get(session).await {
            Some(shared) => shared.lock().await.now_playing().await,
            None => None,
        };
        Ok(match view {
            Some(view) => Reply::NowPlaying(view),
            None => Reply::transient(
                "Nothing is playing.",
                self.registry.options().finished_notice_ttl(),
            ),
        })
    }

    async fn playlist(&self, session: &SessionId, page: usize) -> Result<Reply, CommandError> {
        let view = match self.registry.get(session).await {
            Some(shared) => Some(shared.lock().await.queue_view().await),
            None => None,
        };
        Ok(match view {
            Some(view) if !view.is_empty() => {
                let page = page.min(view.page_count() - 1);
                Reply::Queue { view, page }
            }
            _ => Reply::transient(
                "Empty playlist.",
                self.registry.options().finished_notice_ttl(),
            ),
        })
    }
}

/// Connect and start playing if the player has never been connected
async fn start_if_idle(player: &mut Player, channel: &ChannelId) -> Result<(), CommandError> {
    if player.is_connected() || player.queue().is_empty() {
        return Ok(());
    }

    player.connect(channel).await?;
    if let Err(e) = player.play().await {
        // Already reported to the session by the player.
        tracing::warn!(session = %player.session(), "Initial play failed: {}", e);
    }
    Ok(())
}

fn check_membership<'a>(
    ctx: &'a CommandContext,
    session_channel: Option<&ChannelId>,
) -> Result<&'a ChannelId, CommandError> {
    let Some(user_channel) = ctx.voice_channel.as_ref() else {
        return Err(CommandError::NotInVoiceChannel);
    };
    match session_channel {
        Some(channel) if channel != user_channel => Err(CommandError::WrongVoiceChannel),
        _ => Ok(user_channel),
    }
}

/// Drop deleted listing entries and give each stub a page URL
pub fn playlist_entries(stubs: Vec<TrackStub>) -> Vec<QueueEntry> {
    stubs
        .into_iter()
        .filter(|stub| stub.title != DELETED_VIDEO_TITLE)
        .map(|mut stub| {
            if stub.page_url.is_empty() {
                stub.page_url = format!("{WATCH_URL_PREFIX}{}", stub.id);
            }
            QueueEntry::from(stub)
        })
        .collect()
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    format!("{} {}", count, if count == 1 { singular } else { plural })
}

fn enabled_label(on: bool) -> &'static str {
    if on {
        "enabled"
    } else {
        "disabled"
    }
}
