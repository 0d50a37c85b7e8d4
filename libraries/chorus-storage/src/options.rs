//! Storage locations, read from `chorus.toml` and `CHORUS_*` variables
//!
//! Shares the config file with the player options; each side picks its own
//! keys.

use crate::error::{Result, StorageError};
use crate::{create_pool, run_migrations, JsonSnapshotStore, SqliteSettingsStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "chorus.toml";

/// Environment variable prefix (`CHORUS_DATABASE_URL=...`)
pub const ENV_PREFIX: &str = "CHORUS";

const SQLITE_SCHEME: &str = "sqlite://";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageOptions {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Session snapshots written on shutdown and consumed at startup
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

/// Both stores, ready to hand to a session registry
pub struct Stores {
    pub settings: SqliteSettingsStore,
    pub snapshots: JsonSnapshotStore,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            snapshot_path: default_snapshot_path(),
        }
    }
}

impl StorageOptions {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load from a specific file (if present), then the environment
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut settings = config::Config::builder();

        if path.exists() {
            settings = settings.add_source(config::File::from(path.to_path_buf()));
        }

        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true),
        );

        Ok(settings.build()?.try_deserialize()?)
    }

    /// Open the database (creating its directory), migrate it and set up
    /// the snapshot store
    pub async fn open(&self) -> Result<Stores> {
        if let Some(parent) = self
            .database_url
            .strip_prefix(SQLITE_SCHEME)
            .and_then(|path| Path::new(path).parent())
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let pool = create_pool(&self.database_url).await?;
        run_migrations(&pool).await?;
        tracing::info!(
            snapshots = %self.snapshot_path.display(),
            "Session storage ready"
        );

        Ok(Stores {
            settings: SqliteSettingsStore::new(pool),
            snapshots: JsonSnapshotStore::new(self.snapshot_path.clone()),
        })
    }
}

impl From<config::ConfigError> for StorageError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

fn default_database_url() -> String {
    "sqlite://./data/chorus.db".to_string()
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("./tmp/sessions.json")
}
