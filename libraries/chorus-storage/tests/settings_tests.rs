use chorus_core::{ConfigUpdate, RepeatMode, SessionConfig, SessionId, SettingsStore, Volume};
use chorus_storage::{settings, SqliteSettingsStore, StorageError};

use test_helpers::TestDb;

#[tokio::test]
async fn test_unknown_session_reads_defaults() {
    let db = TestDb::new().await;

    let config = settings::get(db.pool(), &SessionId::new("nobody")).await.unwrap();

    assert_eq!(config, SessionConfig::default());
    assert_eq!(config.volume.level(), 100);
    assert_eq!(config.repeat, RepeatMode::Off);
}

#[tokio::test]
async fn test_each_key_updates_independently() {
    let db = TestDb::new().await;
    let session = SessionId::new("guild-1");

    settings::apply(db.pool(), &session, ConfigUpdate::Volume(Volume::new(35).unwrap()))
        .await
        .unwrap();
    settings::apply(db.pool(), &session, ConfigUpdate::Repeat(RepeatMode::All))
        .await
        .unwrap();
    settings::apply(db.pool(), &session, ConfigUpdate::Shuffle(true))
        .await
        .unwrap();

    let config = settings::get(db.pool(), &session).await.unwrap();
    assert_eq!(config.volume.level(), 35);
    assert_eq!(config.repeat, RepeatMode::All);
    assert!(config.shuffle);
    assert!(!config.autoplay);

    settings::apply(db.pool(), &session, ConfigUpdate::Autoplay(true))
        .await
        .unwrap();
    settings::apply(db.pool(), &session, ConfigUpdate::Shuffle(false))
        .await
        .unwrap();

    let config = settings::get(db.pool(), &session).await.unwrap();
    assert_eq!(config.volume.level(), 35);
    assert!(config.autoplay);
    assert!(!config.shuffle);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let db = TestDb::new().await;
    let first = SessionId::new("guild-1");
    let second = SessionId::new("guild-2");

    settings::apply(db.pool(), &first, ConfigUpdate::Volume(Volume::new(10).unwrap()))
        .await
        .unwrap();

    assert_eq!(settings::get(db.pool(), &first).await.unwrap().volume.level(), 10);
    assert_eq!(
        settings::get(db.pool(), &second).await.unwrap(),
        SessionConfig::default()
    );
}

#[tokio::test]
async fn test_store_trait_round_trip() {
    let db = TestDb::new().await;
    let store = SqliteSettingsStore::new(db.pool().clone());
    let session = SessionId::new("guild-1");

    store
        .update(&session, ConfigUpdate::Repeat(RepeatMode::Single))
        .await
        .unwrap();

    let config = store.load(&session).await.unwrap();
    assert_eq!(config.repeat, RepeatMode::Single);
}

#[tokio::test]
async fn test_settings_survive_reopen() {
    let temp_dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", temp_dir.path().join("chorus.db").display());
    let session = SessionId::new("guild-1");

    {
        let pool = chorus_storage::create_pool(&url).await.unwrap();
        chorus_storage::run_migrations(&pool).await.unwrap();
        settings::apply(&pool, &session, ConfigUpdate::Volume(Volume::new(60).unwrap()))
            .await
            .unwrap();
        pool.close().await;
    }

    let pool = chorus_storage::create_pool(&url).await.unwrap();
    chorus_storage::run_migrations(&pool).await.unwrap();
    assert_eq!(settings::get(&pool, &session).await.unwrap().volume.level(), 60);
}

#[tokio::test]
async fn test_invalid_stored_repeat_is_reported() {
    let db = TestDb::new().await;
    // Bypass the CHECK constraint the way an old schema would have.
    let mut conn = db.pool().acquire().await.unwrap();
    sqlx::query("PRAGMA ignore_check_constraints = ON")
        .execute(&mut *conn)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO session_settings (session_id, repeat_mode, updated_at) VALUES ('bad', 'twice', 0)",
    )
    .execute(&mut *conn)
    .await
    .unwrap();
    drop(conn);

    let result = settings::get(db.pool(), &SessionId::new("bad")).await;

    assert!(matches!(
        result,
        Err(StorageError::InvalidValue { field: "repeat_mode", .. })
    ));
}
