//! Storage options: loading and opening both stores

use chorus_core::{ConfigUpdate, SessionId, SettingsStore, SnapshotStore, Volume};
use chorus_storage::StorageOptions;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

#[test]
fn missing_file_uses_defaults() {
    let options = StorageOptions::load_from(Path::new("/nonexistent/chorus.toml")).unwrap();

    assert_eq!(options.database_url, "sqlite://./data/chorus.db");
    assert_eq!(options.snapshot_path, PathBuf::from("./tmp/sessions.json"));
}

#[test]
fn file_overrides_locations_and_ignores_player_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chorus.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "inactivity_timeout_secs = 30").unwrap();
    writeln!(file, "snapshot_path = \"/var/lib/chorus/sessions.json\"").unwrap();

    let options = StorageOptions::load_from(&path).unwrap();

    assert_eq!(
        options.snapshot_path,
        PathBuf::from("/var/lib/chorus/sessions.json")
    );
    assert_eq!(options.database_url, "sqlite://./data/chorus.db");
}

#[tokio::test]
async fn open_creates_database_directory_and_stores() {
    let dir = tempfile::tempdir().unwrap();
    let options = StorageOptions {
        database_url: format!("sqlite://{}", dir.path().join("data/chorus.db").display()),
        snapshot_path: dir.path().join("tmp/sessions.json"),
    };

    let stores = options.open().await.unwrap();

    assert!(dir.path().join("data/chorus.db").exists());
    assert_eq!(stores.snapshots.path(), options.snapshot_path.as_path());

    let session = SessionId::new("guild-1");
    stores
        .settings
        .update(&session, ConfigUpdate::Volume(Volume::new(55).unwrap()))
        .await
        .unwrap();
    assert_eq!(stores.settings.load(&session).await.unwrap().volume.level(), 55);

    stores.snapshots.save_all(&HashMap::new()).await.unwrap();
    assert!(options.snapshot_path.exists());
}
