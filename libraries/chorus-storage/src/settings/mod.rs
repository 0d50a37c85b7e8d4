//! Per-session configuration rows
//!
//! One row per session in `session_settings`. Sessions without a row read
//! as [`SessionConfig::default`]; the first update inserts the row.
//!
//! # Example
//!
//! ```rust,no_run
//! use chorus_core::{ConfigUpdate, SessionId, Volume};
//! use chorus_storage::settings;
//! # async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//! let session = SessionId::new("guild-1");
//! settings::apply(pool, &session, ConfigUpdate::Volume(Volume::new(40)?)).await?;
//!
//! let config = settings::get(pool, &session).await?;
//! assert_eq!(config.volume.level(), 40);
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, StorageError};
use chorus_core::{ConfigUpdate, RepeatMode, SessionConfig, SessionId, Volume};
use sqlx::{Row, SqlitePool};

/// Stored configuration for `session`, or defaults when none is stored
pub async fn get(pool: &SqlitePool, session: &SessionId) -> Result<SessionConfig> {
    let row = sqlx::query(
        "SELECT volume, repeat_mode, shuffle, autoplay
         FROM session_settings WHERE session_id = ?",
    )
    .bind(session.as_str())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(SessionConfig::default());
    };

    let volume: i64 = row.get("volume");
    let volume = u8::try_from(volume)
        .ok()
        .and_then(|level| Volume::new(level).ok())
        .ok_or_else(|| StorageError::invalid_value("volume", volume))?;

    let repeat: String = row.get("repeat_mode");
    let repeat = repeat
        .parse::<RepeatMode>()
        .map_err(|_| StorageError::invalid_value("repeat_mode", &repeat))?;

    Ok(SessionConfig {
        volume,
        repeat,
        shuffle: row.get::<i64, _>("shuffle") != 0,
        autoplay: row.get::<i64, _>("autoplay") != 0,
    })
}

/// Persist a single key, creating the session's row if needed
pub async fn apply(pool: &SqlitePool, session: &SessionId, update: ConfigUpdate) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO session_settings (session_id, updated_at) VALUES (?, ?)
         ON CONFLICT(session_id) DO NOTHING",
    )
    .bind(session.as_str())
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let query = match update {
        ConfigUpdate::Volume(volume) => {
            sqlx::query("UPDATE session_settings SET volume = ?, updated_at = ? WHERE session_id = ?")
                .bind(i64::from(volume.level()))
        }
        ConfigUpdate::Repeat(mode) => sqlx::query(
            "UPDATE session_settings SET repeat_mode = ?, updated_at = ? WHERE session_id = ?",
        )
        .bind(mode.as_str()),
        ConfigUpdate::Shuffle(enabled) => {
            sqlx::query("UPDATE session_settings SET shuffle = ?, updated_at = ? WHERE session_id = ?")
                .bind(i64::from(enabled))
        }
        ConfigUpdate::Autoplay(enabled) => sqlx::query(
            "UPDATE session_settings SET autoplay = ?, updated_at = ? WHERE session_id = ?",
        )
        .bind(i64::from(enabled)),
    };

    query
        .bind(now)
        .bind(session.as_str())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::debug!(session = %session, ?update, "Stored session setting");
    Ok(())
}
