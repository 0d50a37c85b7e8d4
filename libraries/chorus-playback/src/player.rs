//! Per-session player - the playback state machine
//!
//! A player owns one session's queue, position, voice connection and
//! transient notices. Every operation runs under the player's mutex; stream
//! completions and the inactivity watchdog re-enter through the same mutex
//! and check a generation/epoch number so that work made stale by a newer
//! command is dropped instead of racing it.

use crate::{
    autoplay,
    error::{PlaybackError, Result},
    history::ShuffleHistory,
    messages::{MessageSlot, TransientMessages},
    options::PlayerOptions,
    queue::{Queue, Removal},
    repeat, shuffle,
    types::{NowPlayingView, PlayerState, QueueLine, QueueView},
    watchdog::Watchdog,
};
use chorus_core::{
    ChannelId, CompletionOutcome, ConfigUpdate, ConnectionHandle, MessageId, Notice, Notifier,
    PlaybackCompletion, QueueEntry, Requester, SessionConfig, SessionId, SessionSnapshot,
    SettingsStore, Track, TrackNotice, TrackResolver, UserDirectory, VoiceTransport,
};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;

/// Text reported when the transport refuses to start a stream
pub const PLAYBACK_FAILED_MESSAGE: &str = "Error while playing the song.";

/// A player shared between commands, completion watchers and the watchdog
pub type SharedPlayer = Arc<Mutex<Player>>;

/// External collaborators a player talks to
#[derive(Clone)]
pub struct PlayerDeps {
    pub resolver: Arc<dyn TrackResolver>,
    pub transport: Arc<dyn VoiceTransport>,
    pub notifier: Arc<dyn Notifier>,
    pub settings: Arc<dyn SettingsStore>,
    pub users: Arc<dyn UserDirectory>,
}

pub struct Player {
    session: SessionId,
    deps: PlayerDeps,
    options: PlayerOptions,
    config: SessionConfig,
    queue: Queue,
    history: ShuffleHistory,
    connection: Option<ConnectionHandle>,
    messages: TransientMessages,
    auto_paused: bool,
    /// Reset and detached from the registry; never reused
    retired: bool,
    /// Bumped whenever the current stream's completion must be ignored
    generation: u64,
    watchdog: Watchdog,
    rng: StdRng,
    this: Weak<Mutex<Player>>,
}

impl Player {
    /// Create a shared player, optionally seeded from a snapshot
    pub fn spawn(
        session: SessionId,
        deps: PlayerDeps,
        options: PlayerOptions,
        config: SessionConfig,
        snapshot: Option<SessionSnapshot>,
    ) -> SharedPlayer {
        let queue = snapshot.map(Queue::from_snapshot).unwrap_or_default();

        Arc::new_cyclic(|this| {
            Mutex::new(Player {
                session,
                deps,
                options,
                config,
                queue,
                history: ShuffleHistory::new(),
                connection: None,
                messages: TransientMessages::new(),
                auto_paused: false,
                retired: false,
                generation: 0,
                watchdog: Watchdog::new(),
                rng: StdRng::from_entropy(),
                this: this.clone(),
            })
        })
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn current_index(&self) -> usize {
        self.queue.current_index()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Voice channel the player is connected to
    pub fn voice_channel(&self) -> Option<&ChannelId> {
        self.connection.as_ref().map(|handle| &handle.channel)
    }

    /// Paused by [`Player::auto_pause`] and not resumed since
    pub fn is_auto_paused(&self) -> bool {
        self.auto_paused
    }

    /// Set once a reset player has been dropped from its registry
    pub fn is_retired(&self) -> bool {
        self.retired
    }

    /// Mark this player as discarded so holders of a stale handle move on
    pub fn retire(&mut self) {
        self.watchdog.cancel();
        self.retired = true;
    }

    pub fn is_watchdog_armed(&self) -> bool {
        self.watchdog.is_armed()
    }

    pub fn message(&self, slot: MessageSlot) -> Option<&MessageId> {
        self.messages.get(slot)
    }

    pub fn state(&self) -> PlayerState {
        match &self.connection {
            None => PlayerState::Idle,
            Some(handle) if self.deps.transport.is_paused(handle) => PlayerState::Paused,
            Some(handle) if self.deps.transport.is_playing(handle) => PlayerState::Playing,
            Some(_) => PlayerState::Connected,
        }
    }

    /// Queue and position for persistence
    pub fn snapshot(&self) -> SessionSnapshot {
        self.queue.snapshot()
    }

    /// Join a voice channel (no-op when already connected)
    pub async fn connect(&mut self, channel: &ChannelId) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }

        let handle = self.deps.transport.connect(channel).await?;
        tracing::info!(session = %self.session, channel = %channel, "Connected to voice channel");
        self.connection = Some(handle);
        Ok(())
    }

    /// Append entries, stamping `requester` on those without one
    ///
    /// Returns the 0-based index of the first appended entry.
    pub fn enqueue(&mut self, entries: Vec<QueueEntry>, requester: &Requester) -> usize {
        let first = self.queue.len();
        if entries.is_empty() {
            return first;
        }

        self.watchdog.cancel();
        for mut entry in entries {
            if entry.requested_by().is_none() {
                entry.set_requested_by(Some(requester.clone()));
            }
            self.queue.push(entry);
        }

        tracing::debug!(
            session = %self.session,
            added = self.queue.len() - first,
            total = self.queue.len(),
            "Enqueued tracks"
        );
        first
    }

    /// Play the entry at the current position
    ///
    /// Stubs are materialized and expired links refreshed first. A transport
    /// failure is reported and leaves the position unchanged. A connected
    /// player that fails to start arms the inactivity watchdog.
    pub async fn play(&mut self) -> Result<()> {
        self.watchdog.cancel();
        let result = self.start_current().await;
        if result.is_err() {
            self.arm_watchdog();
        }
        result
    }

    async fn start_current(&mut self) -> Result<()> {

        let handle = self.handle()?;
        if self.queue.is_empty() {
            return Err(PlaybackError::QueueEmpty);
        }

        let index = self.queue.current_index();
        let track = match self.prepare(index).await {
            Ok(track) => track,
            Err(error) => {
                self.report_failure(&error).await;
                return Err(error);
            }
        };

        let completion = match self
            .deps
            .transport
            .play(&handle, track.stream_address(), self.config.volume.gain())
            .await
        {
            Ok(completion) => completion,
            Err(error) => {
                tracing::error!(
                    session = %self.session,
                    title = %track.title,
                    "Failed to start stream: {}",
                    error
                );
                self.send(Notice::PlaybackFailed(PLAYBACK_FAILED_MESSAGE.to_string()), None)
                    .await;
                return Err(error.into());
            }
        };

        self.watch(completion);
        tracing::info!(
            session = %self.session,
            index,
            title = %track.title,
            requester = ?track.requested_by.as_ref().map(|r| r.id().to_string()),
            "Now playing"
        );

        if let Some(notice) = self.track_notice(index).await {
            self.post(MessageSlot::LastPlaying, Notice::NowPlaying(notice), None)
                .await;
        }
        Ok(())
    }

    /// The core transition
    ///
    /// - `stop`: stop and disconnect, keeping queue and position
    /// - `index` in range: jump there and play
    /// - otherwise: shuffle, then autoplay, then repeat decide what plays next
    pub async fn next(&mut self, index: Option<usize>, stop: bool) -> Result<()> {
        self.transition(index, stop, true).await
    }

    /// Skip to the entry after the current one
    pub async fn skip(&mut self) -> Result<()> {
        self.handle()?;
        let index = self.queue.current_index() + 1;
        self.next(Some(index), false).await
    }

    /// Stop playback and leave the voice channel
    pub async fn stop(&mut self) -> Result<()> {
        self.next(None, true).await
    }

    async fn transition(&mut self, index: Option<usize>, stop: bool, announce: bool) -> Result<()> {
        self.watchdog.cancel();

        if announce && (!stop || self.is_playing()) {
            let ttl = stop.then(|| self.options.finished_notice_ttl());
            self.finished_notice(ttl).await;
        }

        if stop {
            self.halt_stream().await;
            self.disconnect().await;
            self.delete_message(MessageSlot::LastPlaying).await;
            return Ok(());
        }

        if let Some(index) = index {
            self.halt_stream().await;

            if index < self.queue.len() {
                self.queue.set_current(index);
                return self.play().await;
            }

            // Past the end: behave as if the last entry just finished.
            let last = self.queue.len().saturating_sub(1);
            self.queue.set_current(index.saturating_sub(1).min(last));
        }

        self.auto_advance().await
    }

    async fn auto_advance(&mut self) -> Result<()> {
        let advanced = if self.apply_shuffle() {
            true
        } else {
            match self.apply_autoplay().await {
                Ok(true) => true,
                Ok(false) => repeat::advance(&mut self.queue, self.config.repeat),
                Err(error) => {
                    // Stall at the attempted transition.
                    tracing::warn!(session = %self.session, "Autoplay failed: {}", error);
                    self.report_failure(&error).await;
                    self.arm_watchdog();
                    return Ok(());
                }
            }
        };

        if advanced {
            return self.play().await;
        }

        tracing::info!(session = %self.session, "Reached end of queue");
        self.arm_watchdog();
        Ok(())
    }

    fn apply_shuffle(&mut self) -> bool {
        if !self.config.shuffle {
            return false;
        }

        match shuffle::pick_next(
            &self.queue,
            &mut self.history,
            self.options.shuffle_max_attempts,
            &mut self.rng,
        ) {
            Some(index) => {
                self.queue.set_current(index);
                true
            }
            None => false,
        }
    }

    async fn apply_autoplay(&mut self) -> Result<bool> {
        if !autoplay::applies(&self.config, &self.options, &self.queue) {
            return Ok(false);
        }
        let Some(current_id) = self.queue.current().map(|entry| entry.id().to_string()) else {
            return Ok(false);
        };

        let related = self.deps.resolver.related_to(&current_id).await?;
        let Some(candidate) = autoplay::first_new_candidate(&self.queue, related) else {
            tracing::debug!(session = %self.session, "No new autoplay candidate");
            return Ok(false);
        };

        let mut track = self.deps.resolver.materialize(&candidate).await?;
        track.requested_by = Some(Requester::resolved(self.deps.users.system_user()));
        tracing::info!(session = %self.session, title = %track.title, "Autoplay queued track");

        self.queue.push(track.into());
        self.queue.set_current(self.queue.current_index() + 1);
        Ok(true)
    }

    /// Remove the entry at a 0-based index
    ///
    /// Removing the current entry while connected moves on to its successor,
    /// or stops entirely when nothing is left.
    pub async fn remove_at(&mut self, index: usize) -> Result<QueueEntry> {
        if index >= self.queue.len() {
            return Err(PlaybackError::IndexOutOfBounds(index));
        }

        if let Some(notice) = self.track_notice(index).await {
            let ttl = self.options.finished_notice_ttl();
            self.send(Notice::Removed(notice), Some(ttl)).await;
        }

        let (entry, removal) = self
            .queue
            .remove(index)
            .ok_or(PlaybackError::IndexOutOfBounds(index))?;
        tracing::info!(session = %self.session, index, title = %entry.title(), "Removed track");

        let result = if removal == Removal::Current && self.connection.is_some() {
            if self.queue.is_empty() {
                self.transition(None, true, false).await
            } else {
                let successor = self.queue.current_index();
                self.transition(Some(successor), false, false).await
            }
        } else {
            Ok(())
        };

        self.clamp_position();
        result.map(|()| entry)
    }

    /// Write one config key through to the store and reload from it
    pub async fn update_config(&mut self, update: ConfigUpdate) -> Result<SessionConfig> {
        self.deps.settings.update(&self.session, update).await?;

        let previous = self.config;
        self.config = self.deps.settings.load(&self.session).await?;
        tracing::info!(session = %self.session, ?update, "Config updated");

        if self.config.volume != previous.volume {
            if let Some(handle) = &self.connection {
                if let Err(error) = self
                    .deps
                    .transport
                    .set_volume(handle, self.config.volume.gain())
                    .await
                {
                    tracing::warn!(session = %self.session, "Failed to apply volume: {}", error);
                }
            }
        }

        Ok(self.config)
    }

    /// Pause the stream; `false` if it was already paused
    pub async fn pause(&mut self) -> Result<bool> {
        let handle = self.handle()?;
        if self.deps.transport.is_paused(&handle) {
            return Ok(false);
        }

        self.deps.transport.pause(&handle).await?;
        tracing::info!(session = %self.session, "Player paused");
        self.post(MessageSlot::Paused, Notice::Paused, None).await;
        Ok(true)
    }

    /// Resume the stream; `false` if it was already playing
    pub async fn resume(&mut self) -> Result<bool> {
        let handle = self.handle()?;
        self.watchdog.cancel();
        if self.deps.transport.is_playing(&handle) {
            return Ok(false);
        }

        self.deps.transport.resume(&handle).await?;
        self.auto_paused = false;
        tracing::info!(session = %self.session, "Player resumed");
        self.delete_message(MessageSlot::Paused).await;
        let ttl = self.options.finished_notice_ttl();
        self.send(Notice::Resumed, Some(ttl)).await;
        Ok(true)
    }

    /// Pause because the voice channel emptied, and start the watchdog
    pub async fn auto_pause(&mut self) -> Result<()> {
        let handle = self.handle()?;
        if !self.deps.transport.is_paused(&handle) {
            self.deps.transport.pause(&handle).await?;
        }

        self.auto_paused = true;
        tracing::info!(session = %self.session, "Player auto-paused");
        self.post(MessageSlot::AutoPaused, Notice::AutoPaused, None)
            .await;
        self.arm_watchdog();
        Ok(())
    }

    /// Undo [`Player::auto_pause`] once someone is back
    pub async fn auto_resume(&mut self) -> Result<()> {
        self.watchdog.cancel();
        self.auto_paused = false;
        self.delete_message(MessageSlot::AutoPaused).await;

        let handle = self.handle()?;
        if self.deps.transport.is_paused(&handle) {
            self.deps.transport.resume(&handle).await?;
            tracing::info!(session = %self.session, "Player auto-resumed");
        }
        Ok(())
    }

    /// Tear everything down and return to defaults
    pub async fn reset(&mut self) -> Result<()> {
        self.watchdog.cancel();
        for slot in MessageSlot::ALL {
            self.delete_message(slot).await;
        }

        let result = self.transition(None, true, true).await;

        self.queue.clear();
        self.history.clear();
        self.messages = TransientMessages::new();
        self.auto_paused = false;
        tracing::info!(session = %self.session, "Player reset");
        result
    }

    /// Details of the current entry
    pub async fn now_playing(&self) -> Option<NowPlayingView> {
        let index = self.queue.current_index();
        let entry = self.queue.get(index)?;
        let requester = self.requester_name(entry).await;
        let track = entry.as_resolved();

        Some(NowPlayingView {
            position: index + 1,
            title: entry.title().to_string(),
            page_url: entry.page_url().to_string(),
            uploader_name: track.and_then(|t| t.uploader_name.clone()),
            upload_date: track.and_then(|t| t.upload_date),
            duration_seconds: entry.duration_seconds(),
            view_count: track.and_then(|t| t.view_count),
            description: track.map(|t| t.description.clone()),
            thumbnail_url: track.and_then(|t| t.thumbnail_url.clone()),
            requester,
            config: self.config,
        })
    }

    /// Listing of the whole queue
    pub async fn queue_view(&self) -> QueueView {
        let mut lines = Vec::with_capacity(self.queue.len());
        let mut total_duration_seconds = 0;

        for (index, entry) in self.queue.iter().enumerate() {
            total_duration_seconds += entry.duration_seconds().unwrap_or(0);
            lines.push(QueueLine {
                position: index + 1,
                title: entry.title().to_string(),
                page_url: entry.page_url().to_string(),
                duration_seconds: entry.duration_seconds(),
                requester: self.requester_name(entry).await,
                is_current: index == self.queue.current_index(),
            });
        }

        QueueView {
            lines,
            total_duration_seconds,
            config: self.config,
        }
    }

    fn handle(&self) -> Result<ConnectionHandle> {
        self.connection.clone().ok_or(PlaybackError::NotConnected)
    }

    fn is_playing(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|handle| self.deps.transport.is_playing(handle))
    }

    /// Resolved track for `index`, refreshing the queue entry if needed
    async fn prepare(&mut self, index: usize) -> Result<Track> {
        let entry = self
            .queue
            .get(index)
            .cloned()
            .ok_or(PlaybackError::IndexOutOfBounds(index))?;

        let mut track = match entry {
            QueueEntry::Resolved(track) => track,
            QueueEntry::Stub(stub) => {
                let mut track = self.deps.resolver.materialize(&stub).await?;
                track.requested_by = stub.requested_by;
                self.queue.replace(index, track.clone().into());
                track
            }
        };

        if self
            .deps
            .resolver
            .is_expired(track.stream_address(), Utc::now())
        {
            tracing::warn!(session = %self.session, title = %track.title, "Link expired");
            let fresh = self.deps.resolver.materialize(&track.to_stub()).await?;
            track.refresh_stream(fresh.stream_address());
            self.queue.replace(index, track.clone().into());
            tracing::info!(session = %self.session, title = %track.title, "Fetched new link");
        }

        Ok(track)
    }

    /// Follow a started stream; its completion advances the queue
    fn watch(&mut self, completion: PlaybackCompletion) {
        self.generation += 1;
        let generation = self.generation;
        let player = self.this.clone();

        tokio::spawn(async move {
            let outcome = completion.wait().await;
            if let Some(player) = player.upgrade() {
                player.lock().await.on_completion(generation, outcome).await;
            }
        });
    }

    async fn on_completion(&mut self, generation: u64, outcome: CompletionOutcome) {
        if generation != self.generation {
            tracing::debug!(session = %self.session, generation, "Ignoring stale completion");
            return;
        }

        match outcome {
            CompletionOutcome::Finished => {}
            CompletionOutcome::Failed(error) => {
                tracing::warn!(session = %self.session, "Stream ended with error: {}", error);
            }
            CompletionOutcome::Dropped => {
                tracing::warn!(session = %self.session, "Stream dropped by transport");
                self.arm_watchdog();
                return;
            }
        }

        if let Err(error) = self.next(None, false).await {
            tracing::warn!(session = %self.session, "Failed to advance queue: {}", error);
        }
    }

    fn arm_watchdog(&mut self) {
        if self.connection.is_none() || self.retired {
            return;
        }

        let player = self.this.clone();
        self.watchdog
            .arm(self.options.inactivity_timeout(), move |epoch| async move {
                if let Some(player) = player.upgrade() {
                    player.lock().await.on_inactivity_timeout(epoch).await;
                }
            });
    }

    async fn on_inactivity_timeout(&mut self, epoch: u64) {
        if !self.watchdog.claim(epoch) {
            tracing::debug!(session = %self.session, epoch, "Ignoring stale watchdog");
            return;
        }

        tracing::info!(session = %self.session, "Player has been reset due to timeout");
        self.delete_message(MessageSlot::AutoPaused).await;
        if let Err(error) = self.reset().await {
            tracing::warn!(session = %self.session, "Timeout reset failed: {}", error);
        }
        self.send(Notice::TimeoutReset, None).await;
    }

    /// Detach the current completion and stop the transport
    async fn halt_stream(&mut self) {
        self.generation += 1;
        if let Some(handle) = &self.connection {
            if let Err(error) = self.deps.transport.stop(handle).await {
                tracing::warn!(session = %self.session, "Failed to stop stream: {}", error);
            }
        }
    }

    async fn disconnect(&mut self) {
        self.auto_paused = false;
        if let Some(handle) = self.connection.take() {
            if let Err(error) = self.deps.transport.disconnect(&handle).await {
                tracing::warn!(session = %self.session, "Failed to disconnect: {}", error);
            }
            tracing::info!(session = %self.session, "Disconnected from voice channel");
        }
    }

    fn clamp_position(&mut self) {
        let len = self.queue.len();
        if self.queue.current_index() >= len {
            self.queue.set_current(len.saturating_sub(1));
        }
    }

    async fn finished_notice(&mut self, ttl: Option<Duration>) {
        let index = self.queue.current_index();
        let Some(notice) = self.track_notice(index).await else {
            return;
        };

        tracing::info!(
            session = %self.session,
            index,
            title = %notice.title,
            requester = ?notice.requester,
            "Finished playing"
        );
        self.post(MessageSlot::LastFinished, Notice::Finished(notice), ttl)
            .await;
    }

    async fn track_notice(&self, index: usize) -> Option<TrackNotice> {
        let entry = self.queue.get(index)?;
        Some(TrackNotice {
            position: index + 1,
            title: entry.title().to_string(),
            page_url: entry.page_url().to_string(),
            duration_seconds: entry.duration_seconds(),
            requester: self.requester_name(entry).await,
            config: self.config,
        })
    }

    /// Display name of whoever queued `entry`, looked up lazily
    async fn requester_name(&self, entry: &QueueEntry) -> Option<String> {
        let requester = entry.requested_by()?;
        let users = Arc::clone(&self.deps.users);
        let name = requester
            .profile(|id| async move { users.lookup(&id).await })
            .await
            .map(|profile| profile.display_name.clone())
            .unwrap_or_else(|| requester.id().to_string());
        Some(name)
    }

    async fn report_failure(&self, error: &PlaybackError) {
        let notice = match error {
            PlaybackError::Core(core) if core.is_resolution() => {
                Notice::ResolutionFailed(core.to_string())
            }
            other => Notice::info(other.to_string()),
        };
        self.send(notice, None).await;
    }

    async fn send(&self, notice: Notice, delete_after: Option<Duration>) -> Option<MessageId> {
        match self
            .deps
            .notifier
            .send(&self.session, notice, delete_after)
            .await
        {
            Ok(message) => Some(message),
            Err(error) => {
                tracing::warn!(session = %self.session, "Failed to send notice: {}", error);
                None
            }
        }
    }

    /// Send a notice into `slot`, deleting the one it supersedes
    async fn post(&mut self, slot: MessageSlot, notice: Notice, delete_after: Option<Duration>) {
        self.delete_message(slot).await;
        if let Some(message) = self.send(notice, delete_after).await {
            self.messages.set(slot, message);
        }
    }

    async fn delete_message(&mut self, slot: MessageSlot) {
        let Some(message) = self.messages.take(slot) else {
            return;
        };

        if let Err(error) = self.deps.notifier.delete(&self.session, &message).await {
            tracing::debug!(session = %self.session, ?slot, "Failed to delete notice: {}", error);
        }
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("session", &self.session)
            .field("config", &self.config)
            .field("queue_len", &self.queue.len())
            .field("current_index", &self.queue.current_index())
            .field("connection", &self.connection)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
