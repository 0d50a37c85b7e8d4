use crate::settings;
use async_trait::async_trait;
use chorus_core::{ConfigUpdate, Result, SessionConfig, SessionId, SettingsStore};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Session store backed by `SQLite`
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn load(&self, session: &SessionId) -> Result<SessionConfig> {
        Ok(settings::get(&self.pool, session).await?)
    }

    async fn update(&self, session: &SessionId, update: ConfigUpdate) -> Result<()> {
        Ok(settings::apply(&self.pool, session, update).await?)
    }
}

/// Session store kept in memory, for embedding without a database
#[derive(Default)]
pub struct MemorySettingsStore {
    configs: RwLock<HashMap<SessionId, SessionConfig>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self, session: &SessionId) -> Result<SessionConfig> {
        Ok(self
            .configs
            .read()
            .await
            .get(session)
            .copied()
            .unwrap_or_default())
    }

    async fn update(&self, session: &SessionId, update: ConfigUpdate) -> Result<()> {
        self.configs
            .write()
            .await
            .entry(session.clone())
            .or_default()
            .apply(update);
        Ok(())
    }
}
