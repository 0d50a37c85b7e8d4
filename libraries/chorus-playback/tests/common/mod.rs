//! Shared test helpers: in-process fakes of every collaborator
#![allow(dead_code)]

use async_trait::async_trait;
use chorus_core::{
    ChannelId, ChorusError, CompletionSender, ConfigUpdate, ConnectionHandle, MessageId, Notice,
    Notifier, PlaybackCompletion, QueueEntry, Requester, Resolution, Result, SessionConfig,
    SessionId, SessionSnapshot, SettingsStore, SnapshotStore, Track, TrackResolver, TrackStub,
    UserDirectory, UserId, UserProfile, VoiceTransport,
};
use chorus_playback::{Player, PlayerDeps, PlayerOptions, SessionRegistry, SharedPlayer};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::sync::Notify;

// ===== Helpers =====

static INIT: Once = Once::new();

/// Route player logs to the test output, once per test binary
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

pub fn stream_url(id: &str, expires: DateTime<Utc>) -> String {
    format!(
        "https://cdn.test/videoplayback?id={id}&expire={}",
        expires.timestamp()
    )
}

/// Track whose stream link is good for hours
pub fn fresh_track(id: &str) -> Track {
    Track::new(
        id,
        format!("Track {id}"),
        stream_url(id, Utc::now() + ChronoDuration::hours(6)),
    )
    .with_duration(180)
    .with_page_url(format!("https://video.test/{id}"))
}

pub fn entries(ids: &[&str]) -> Vec<QueueEntry> {
    ids.iter().map(|id| QueueEntry::from(fresh_track(id))).collect()
}

pub fn stubs(ids: &[&str]) -> Vec<TrackStub> {
    ids.iter()
        .map(|id| TrackStub::new(*id, format!("Track {id}")))
        .collect()
}

pub fn session() -> SessionId {
    SessionId::new("guild-1")
}

pub fn voice() -> ChannelId {
    ChannelId::new("voice-1")
}

pub fn alice() -> UserProfile {
    UserProfile::new("u-alice", "alice")
}

pub fn requester() -> Requester {
    Requester::resolved(alice())
}

/// Let spawned completion watchers run to quiescence
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

pub fn ids(player: &Player) -> Vec<String> {
    player
        .queue()
        .iter()
        .map(|entry| entry.id().to_string())
        .collect()
}

// ===== Resolver =====

#[derive(Default)]
pub struct FakeResolver {
    queries: Mutex<HashMap<String, Resolution>>,
    related: Mutex<HashMap<String, Vec<TrackStub>>>,
    unavailable: Mutex<HashSet<String>>,
    materialized: Mutex<Vec<String>>,
    fail_related: AtomicBool,
    resolve_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeResolver {
    pub fn on_query(&self, query: &str, resolution: Resolution) {
        self.queries
            .lock()
            .unwrap()
            .insert(query.to_string(), resolution);
    }

    pub fn set_related(&self, id: &str, related: Vec<TrackStub>) {
        self.related.lock().unwrap().insert(id.to_string(), related);
    }

    pub fn make_unavailable(&self, id: &str) {
        self.unavailable.lock().unwrap().insert(id.to_string());
    }

    /// Make the next `resolve` wait until the returned gate is notified
    pub fn hold_next_resolve(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.resolve_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn fail_related(&self) {
        self.fail_related.store(true, Ordering::SeqCst);
    }

    /// Ids passed to `materialize`, in order
    pub fn materialized(&self) -> Vec<String> {
        self.materialized.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackResolver for FakeResolver {
    async fn resolve(&self, query: &str) -> Result<Resolution> {
        let gate = self.resolve_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.queries
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .ok_or_else(|| ChorusError::resolution(format!("no match for {query}")))
    }

    async fn materialize(&self, stub: &TrackStub) -> Result<Track> {
        self.materialized.lock().unwrap().push(stub.id.clone());
        if self.unavailable.lock().unwrap().contains(&stub.id) {
            return Err(ChorusError::not_available(format!("{} is unavailable", stub.id)));
        }

        let mut track = fresh_track(&stub.id);
        track.title = stub.title.clone();
        Ok(track)
    }

    async fn related_to(&self, track_id: &str) -> Result<Vec<TrackStub>> {
        if self.fail_related.load(Ordering::SeqCst) {
            return Err(ChorusError::resolution("related search rate-limited"));
        }
        Ok(self
            .related
            .lock()
            .unwrap()
            .get(track_id)
            .cloned()
            .unwrap_or_default())
    }
}

// ===== Transport =====

#[derive(Default)]
pub struct TransportState {
    pub connected: Option<ConnectionHandle>,
    pub played: Vec<String>,
    pub volumes: Vec<f32>,
    pub playing: bool,
    pub paused: bool,
    pub pending: Vec<CompletionSender>,
    pub fail_next_play: bool,
    pub stops: usize,
    pub disconnects: usize,
}

#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<TransportState>,
    next_id: AtomicU64,
}

impl FakeTransport {
    pub fn fail_next_play(&self) {
        self.state.lock().unwrap().fail_next_play = true;
    }

    /// End the active stream as if it played to the end
    pub fn finish_current(&self) {
        let sender = {
            let mut state = self.state.lock().unwrap();
            state.playing = false;
            state.paused = false;
            state.pending.pop()
        };
        if let Some(sender) = sender {
            sender.finish(Ok(()));
        }
    }

    /// End the active stream with a decoder error
    pub fn fail_current(&self, error: &str) {
        let sender = {
            let mut state = self.state.lock().unwrap();
            state.playing = false;
            state.pending.pop()
        };
        if let Some(sender) = sender {
            sender.finish(Err(error.to_string()));
        }
    }

    /// Tear the active stream down without reporting anything
    pub fn drop_current(&self) {
        let mut state = self.state.lock().unwrap();
        state.playing = false;
        state.pending.pop();
    }

    /// Stream addresses started so far
    pub fn played(&self) -> Vec<String> {
        self.state.lock().unwrap().played.clone()
    }

    pub fn played_ids(&self) -> Vec<String> {
        self.played()
            .iter()
            .filter_map(|address| {
                url::Url::parse(address).ok().and_then(|url| {
                    url.query_pairs()
                        .find(|(key, _)| key == "id")
                        .map(|(_, value)| value.into_owned())
                })
            })
            .collect()
    }

    pub fn volumes(&self) -> Vec<f32> {
        self.state.lock().unwrap().volumes.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected.is_some()
    }

    pub fn stops(&self) -> usize {
        self.state.lock().unwrap().stops
    }

    pub fn disconnects(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }

    pub fn playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }

    pub fn paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }
}

#[async_trait]
impl VoiceTransport for FakeTransport {
    async fn connect(&self, channel: &ChannelId) -> Result<ConnectionHandle> {
        let handle = ConnectionHandle::new(
            self.next_id.fetch_add(1, Ordering::SeqCst),
            channel.clone(),
        );
        self.state.lock().unwrap().connected = Some(handle.clone());
        Ok(handle)
    }

    async fn play(
        &self,
        _handle: &ConnectionHandle,
        stream_address: &str,
        volume: f32,
    ) -> Result<PlaybackCompletion> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next_play {
            state.fail_next_play = false;
            return Err(ChorusError::transport("already playing audio"));
        }

        let (sender, completion) = PlaybackCompletion::channel();
        state.played.push(stream_address.to_string());
        state.volumes.push(volume);
        state.playing = true;
        state.paused = false;
        state.pending.push(sender);
        Ok(completion)
    }

    async fn set_volume(&self, _handle: &ConnectionHandle, volume: f32) -> Result<()> {
        self.state.lock().unwrap().volumes.push(volume);
        Ok(())
    }

    async fn pause(&self, _handle: &ConnectionHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.playing = false;
        state.paused = true;
        Ok(())
    }

    async fn resume(&self, _handle: &ConnectionHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.playing = true;
        state.paused = false;
        Ok(())
    }

    async fn stop(&self, _handle: &ConnectionHandle) -> Result<()> {
        let pending: Vec<CompletionSender> = {
            let mut state = self.state.lock().unwrap();
            state.stops += 1;
            state.playing = false;
            state.paused = false;
            state.pending.drain(..).collect()
        };
        // A stopped stream still reports completion, like a real voice client.
        for sender in pending {
            sender.finish(Ok(()));
        }
        Ok(())
    }

    async fn disconnect(&self, _handle: &ConnectionHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.connected = None;
        state.playing = false;
        state.paused = false;
        state.disconnects += 1;
        Ok(())
    }

    fn is_playing(&self, _handle: &ConnectionHandle) -> bool {
        self.state.lock().unwrap().playing
    }

    fn is_paused(&self, _handle: &ConnectionHandle) -> bool {
        self.state.lock().unwrap().paused
    }
}

// ===== Notifier =====

#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub id: MessageId,
    pub notice: Notice,
    pub delete_after: Option<Duration>,
}

#[derive(Default)]
pub struct FakeNotifier {
    sent: Mutex<Vec<Sent>>,
    deleted: Mutex<Vec<MessageId>>,
    next_id: AtomicU64,
}

impl FakeNotifier {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.sent().into_iter().map(|sent| sent.notice).collect()
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Notice) -> bool) -> usize {
        self.notices().iter().filter(|notice| matches(notice)).count()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
        self.deleted.lock().unwrap().clear();
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send(
        &self,
        _session: &SessionId,
        notice: Notice,
        delete_after: Option<Duration>,
    ) -> Result<MessageId> {
        let id = MessageId::new(format!("m{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        self.sent.lock().unwrap().push(Sent {
            id: id.clone(),
            notice,
            delete_after,
        });
        Ok(id)
    }

    async fn delete(&self, _session: &SessionId, message: &MessageId) -> Result<()> {
        self.deleted.lock().unwrap().push(message.clone());
        Ok(())
    }
}

// ===== Settings =====

#[derive(Default)]
pub struct FakeSettings {
    configs: Mutex<HashMap<SessionId, SessionConfig>>,
    fail_loads: AtomicBool,
    load_gates: Mutex<HashMap<SessionId, Arc<Notify>>>,
}

impl FakeSettings {
    pub fn set(&self, session: &SessionId, config: SessionConfig) {
        self.configs
            .lock()
            .unwrap()
            .insert(session.clone(), config);
    }

    pub fn stored(&self, session: &SessionId) -> Option<SessionConfig> {
        self.configs.lock().unwrap().get(session).copied()
    }

    /// Make the next `load` for `session` wait until the gate is notified
    pub fn hold_next_load(&self, session: &SessionId) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.load_gates
            .lock()
            .unwrap()
            .insert(session.clone(), gate.clone());
        gate
    }

    pub fn fail_loads(&self) {
        self.fail_loads.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SettingsStore for FakeSettings {
    async fn load(&self, session: &SessionId) -> Result<SessionConfig> {
        let gate = self.load_gates.lock().unwrap().remove(session);
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(ChorusError::storage("settings database is locked"));
        }
        Ok(self.stored(session).unwrap_or_default())
    }

    async fn update(&self, session: &SessionId, update: ConfigUpdate) -> Result<()> {
        self.configs
            .lock()
            .unwrap()
            .entry(session.clone())
            .or_default()
            .apply(update);
        Ok(())
    }
}

// ===== Snapshots =====

#[derive(Default)]
pub struct FakeSnapshots {
    stored: Mutex<HashMap<SessionId, SessionSnapshot>>,
    fail: AtomicBool,
}

impl FakeSnapshots {
    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn insert(&self, session: SessionId, snapshot: SessionSnapshot) {
        self.stored.lock().unwrap().insert(session, snapshot);
    }

    pub fn len(&self) -> usize {
        self.stored.lock().unwrap().len()
    }
}

#[async_trait]
impl SnapshotStore for FakeSnapshots {
    async fn take_all(&self) -> Result<HashMap<SessionId, SessionSnapshot>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ChorusError::persistence("snapshot file is corrupt"));
        }
        Ok(std::mem::take(&mut *self.stored.lock().unwrap()))
    }

    async fn save_all(&self, snapshots: &HashMap<SessionId, SessionSnapshot>) -> Result<()> {
        // Round-trip through JSON like a real store would.
        let json = serde_json::to_string(snapshots)?;
        *self.stored.lock().unwrap() = serde_json::from_str(&json)?;
        Ok(())
    }
}

// ===== Users =====

#[derive(Default)]
pub struct FakeUsers {
    lookups: AtomicU64,
}

impl FakeUsers {
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserDirectory for FakeUsers {
    async fn lookup(&self, id: &UserId) -> Option<UserProfile> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match id.as_str() {
            "u-alice" => Some(alice()),
            "u-bob" => Some(UserProfile::new("u-bob", "bob")),
            _ => None,
        }
    }

    fn system_user(&self) -> UserProfile {
        UserProfile::new("bot", "Chorus")
    }
}

// ===== Harness =====

pub struct Harness {
    pub resolver: Arc<FakeResolver>,
    pub transport: Arc<FakeTransport>,
    pub notifier: Arc<FakeNotifier>,
    pub settings: Arc<FakeSettings>,
    pub users: Arc<FakeUsers>,
}

impl Harness {
    pub fn new() -> Self {
        init_logging();
        Self {
            resolver: Arc::new(FakeResolver::default()),
            transport: Arc::new(FakeTransport::default()),
            notifier: Arc::new(FakeNotifier::default()),
            settings: Arc::new(FakeSettings::default()),
            users: Arc::new(FakeUsers::default()),
        }
    }

    pub fn deps(&self) -> PlayerDeps {
        PlayerDeps {
            resolver: self.resolver.clone(),
            transport: self.transport.clone(),
            notifier: self.notifier.clone(),
            settings: self.settings.clone(),
            users: self.users.clone(),
        }
    }

    pub fn player(&self, config: SessionConfig) -> SharedPlayer {
        self.settings.set(&session(), config);
        Player::spawn(session(), self.deps(), PlayerOptions::default(), config, None)
    }

    /// Connected player with `ids` queued and the first one playing
    pub async fn playing(&self, config: SessionConfig, ids: &[&str]) -> SharedPlayer {
        let player = self.player(config);
        {
            let mut guard = player.lock().await;
            guard.enqueue(entries(ids), &requester());
            guard.connect(&voice()).await.unwrap();
            guard.play().await.unwrap();
        }
        player
    }

    pub fn registry(&self) -> SessionRegistry {
        SessionRegistry::new(self.deps(), PlayerOptions::default())
    }
}
