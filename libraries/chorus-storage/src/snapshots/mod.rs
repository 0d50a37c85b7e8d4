//! Session snapshots in a JSON file
//!
//! The file maps session ids to `{current_index, queue}`. It is written on
//! orderly shutdown and consumed once at the next startup: reading removes
//! it, so a crash after startup never replays a stale queue.

use crate::error::Result;
use async_trait::async_trait;
use chorus_core::{ChorusError, SessionId, SessionSnapshot, SnapshotStore};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and remove the snapshot file; a missing file reads as empty
    pub async fn read_and_remove(&self) -> Result<HashMap<SessionId, SessionSnapshot>> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No snapshot file");
                return Ok(HashMap::new());
            }
            Err(e) => return Err(e.into()),
        };

        // Consumed even when unreadable.
        tokio::fs::remove_file(&self.path).await?;

        let snapshots: HashMap<SessionId, SessionSnapshot> = serde_json::from_slice(&contents)?;
        let (usable, skipped): (HashMap<_, _>, HashMap<_, _>) = snapshots
            .into_iter()
            .partition(|(_, snapshot)| snapshot.is_consistent());
        for session in skipped.keys() {
            tracing::warn!(session = %session, "Discarding snapshot with out-of-range position");
        }

        tracing::info!(path = %self.path.display(), sessions = usable.len(), "Loaded snapshots");
        Ok(usable)
    }

    /// Replace the snapshot file with `snapshots`
    ///
    /// Writes to a sibling temp file first so a crash mid-write leaves no
    /// truncated JSON behind.
    pub async fn write(&self, snapshots: &HashMap<SessionId, SessionSnapshot>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(snapshots)?;
        let temp = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::info!(path = %self.path.display(), sessions = snapshots.len(), "Saved snapshots");
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for JsonSnapshotStore {
    async fn take_all(&self) -> chorus_core::Result<HashMap<SessionId, SessionSnapshot>> {
        self.read_and_remove()
            .await
            .map_err(|e| ChorusError::persistence(e.to_string()))
    }

    async fn save_all(
        &self,
        snapshots: &HashMap<SessionId, SessionSnapshot>,
    ) -> chorus_core::Result<()> {
        self.write(snapshots)
            .await
            .map_err(|e| ChorusError::persistence(e.to_string()))
    }
}
