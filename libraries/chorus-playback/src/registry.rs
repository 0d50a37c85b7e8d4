//! Session registry - session id to player mapping
//!
//! The only process-wide mutable structure. Each session gets a creation
//! slot under the map lock; the player itself is built outside it, so
//! concurrent commands for an unknown session share one player without
//! holding up lookups for other sessions.

use crate::error::Result;
use crate::options::PlayerOptions;
use crate::player::{Player, PlayerDeps, SharedPlayer};
use chorus_core::{SessionId, SessionSnapshot, SnapshotStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

type Slot = Arc<OnceCell<SharedPlayer>>;

#[derive(Default)]
struct Sessions {
    active: HashMap<SessionId, Slot>,
    /// Snapshots restored at startup, consumed on first use
    pending: HashMap<SessionId, SessionSnapshot>,
}

pub struct SessionRegistry {
    deps: PlayerDeps,
    options: PlayerOptions,
    sessions: Mutex<Sessions>,
}

impl SessionRegistry {
    pub fn new(deps: PlayerDeps, options: PlayerOptions) -> Self {
        Self {
            deps,
            options,
            sessions: Mutex::new(Sessions::default()),
        }
    }

    pub fn deps(&self) -> &PlayerDeps {
        &self.deps
    }

    pub fn options(&self) -> &PlayerOptions {
        &self.options
    }

    /// Load persisted snapshots for sessions not created yet
    ///
    /// A store failure is logged and startup continues with no snapshots.
    /// Returns the number of snapshots loaded.
    pub async fn restore(&self, store: &dyn SnapshotStore) -> usize {
        let snapshots = match store.take_all().await {
            Ok(snapshots) => snapshots,
            Err(e) => {
                tracing::warn!("Failed to load session snapshots: {}", e);
                return 0;
            }
        };

        let mut sessions = self.sessions.lock().await;
        let mut loaded = 0;
        for (session, snapshot) in snapshots {
            if snapshot.is_empty() || sessions.active.contains_key(&session) {
                continue;
            }
            sessions.pending.insert(session, snapshot);
            loaded += 1;
        }

        tracing::info!(sessions = loaded, "Restored session snapshots");
        loaded
    }

    /// Existing player for `session`, or a new one seeded from the session
    /// store and any pending snapshot
    pub async fn get_or_create(&self, session: &SessionId) -> SharedPlayer {
        let slot = self
            .sessions
            .lock()
            .await
            .active
            .entry(session.clone())
            .or_default()
            .clone();

        slot.get_or_init(|| self.create(session)).await.clone()
    }

    async fn create(&self, session: &SessionId) -> SharedPlayer {
        let config = match self.deps.settings.load(session).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(session = %session, "Failed to load settings, using defaults: {}", e);
                Default::default()
            }
        };
        let snapshot = self.sessions.lock().await.pending.remove(session);
        if let Some(snapshot) = &snapshot {
            tracing::info!(
                session = %session,
                tracks = snapshot.queue.len(),
                index = snapshot.current_index,
                "Seeding player from snapshot"
            );
        }

        tracing::debug!(session = %session, "Created player");
        Player::spawn(
            session.clone(),
            self.deps.clone(),
            self.options.clone(),
            config,
            snapshot,
        )
    }

    pub async fn get(&self, session: &SessionId) -> Option<SharedPlayer> {
        self.sessions
            .lock()
            .await
            .active
            .get(session)
            .and_then(|slot| slot.get().cloned())
    }

    /// Discard a player; the caller must have disconnected it already
    pub async fn remove(&self, session: &SessionId) -> Option<SharedPlayer> {
        let removed = self.sessions.lock().await.active.remove(session)?;
        tracing::debug!(session = %session, "Removed player");
        removed.get().cloned()
    }

    /// Discard `player` if it is still the one registered for `session`
    pub async fn remove_player(&self, session: &SessionId, player: &SharedPlayer) -> bool {
        let mut sessions = self.sessions.lock().await;
        let registered = sessions
            .active
            .get(session)
            .and_then(|slot| slot.get())
            .is_some_and(|current| Arc::ptr_eq(current, player));
        if registered {
            sessions.active.remove(session);
            tracing::debug!(session = %session, "Removed player");
        }
        registered
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.active.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot every active player with something queued
    pub async fn snapshots(&self) -> HashMap<SessionId, SessionSnapshot> {
        let players: Vec<(SessionId, SharedPlayer)> = {
            let sessions = self.sessions.lock().await;
            sessions
                .active
                .iter()
                .filter_map(|(id, slot)| slot.get().map(|player| (id.clone(), player.clone())))
                .collect()
        };

        let mut snapshots = HashMap::with_capacity(players.len());
        for (session, player) in players {
            let snapshot = player.lock().await.snapshot();
            if !snapshot.is_empty() {
                snapshots.insert(session, snapshot);
            }
        }
        snapshots
    }

    /// Persist all active sessions for the next startup
    ///
    /// Returns the number of sessions saved.
    pub async fn shutdown(&self, store: &dyn SnapshotStore) -> Result<usize> {
        let snapshots = self.snapshots().await;
        if let Err(e) = store.save_all(&snapshots).await {
            tracing::error!("Failed to save session snapshots: {}", e);
            return Err(e.into());
        }

        tracing::info!(sessions = snapshots.len(), "Saved session snapshots");
        Ok(snapshots.len())
    }
}
