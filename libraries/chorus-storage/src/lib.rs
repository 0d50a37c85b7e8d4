//! Chorus Storage
//!
//! Persistence for Chorus playback sessions.
//!
//! This crate provides:
//! - The Session Store: per-session configuration in `SQLite`
//!   ([`SqliteSettingsStore`]) or in memory ([`MemorySettingsStore`])
//! - The snapshot store: queues saved on shutdown and consumed once at the
//!   next startup ([`JsonSnapshotStore`])
//!
//! # Example
//!
//! ```rust,no_run
//! use chorus_storage::StorageOptions;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let stores = StorageOptions::load()?.open().await?;
//! let settings = stores.settings;
//! let snapshots = stores.snapshots;
//! # Ok(())
//! # }
//! ```

mod error;
mod options;
mod store;

// Vertical slices
pub mod settings;
pub mod snapshots;

pub use error::{Result, StorageError};
pub use options::{StorageOptions, Stores};
pub use snapshots::JsonSnapshotStore;
pub use store::{MemorySettingsStore, SqliteSettingsStore};

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Call once at startup, before the first store operation.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://chorus.db>`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::info!(url = database_url, "Opened session database");
    Ok(pool)
}
