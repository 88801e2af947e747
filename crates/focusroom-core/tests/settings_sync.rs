//! Settings synchronizer against real backends.

use std::sync::Arc;
use std::time::Duration;

use focusroom_core::{
    HttpStore, SettingsSynchronizer, SqliteStore, SyncStatus, TimerSettings, TimerSettingsPatch,
};
use mockito::Matcher;
use serde_json::json;

fn focus(minutes: u32) -> TimerSettingsPatch {
    TimerSettingsPatch {
        focus_minutes: Some(minutes),
        ..TimerSettingsPatch::default()
    }
}

fn settings_body(focus: u32) -> String {
    json!({
        "id": 1,
        "focus_session": focus,
        "short_break": 5,
        "long_break": 15,
        "long_break_after": 4,
        "sound_enabled": true,
        "focus_break_sound": true,
        "pause_start_sound": true
    })
    .to_string()
}

#[tokio::test]
async fn http_outage_keeps_local_edit_until_the_api_recovers() {
    let mut server = mockito::Server::new_async().await;
    let get_down = server
        .mock("GET", "/timer-settings/")
        .with_status(503)
        .create_async()
        .await;
    let put_down = server
        .mock("PUT", "/timer-settings/")
        .with_status(503)
        .create_async()
        .await;

    let store = Arc::new(HttpStore::new(&server.url(), None, Duration::from_secs(5)).unwrap());
    let sync = SettingsSynchronizer::new(store);

    assert_eq!(sync.load().await, TimerSettings::default());
    assert!(matches!(sync.status(), SyncStatus::Unsynced { .. }));

    let err = sync.update(&focus(30)).await.unwrap_err();
    assert!(err.is_persistence());
    assert_eq!(sync.current().focus_minutes, 30);
    assert_eq!(sync.load().await.focus_minutes, 30);

    get_down.remove_async().await;
    put_down.remove_async().await;
    let put_up = server
        .mock("PUT", "/timer-settings/")
        .match_body(Matcher::PartialJson(json!({ "focus_session": 30 })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(settings_body(30))
        .create_async()
        .await;

    assert_eq!(sync.load().await.focus_minutes, 30);
    assert!(sync.status().is_synced());
    put_up.assert_async().await;
}

#[tokio::test]
async fn sqlite_settings_persist_across_synchronizers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focusroom.db");

    {
        let sync = SettingsSynchronizer::new(Arc::new(SqliteStore::open(&path).unwrap()));
        sync.load().await;
        sync.update(&TimerSettingsPatch {
            long_break_after: Some(3),
            sound_enabled: Some(false),
            ..TimerSettingsPatch::default()
        })
        .await
        .unwrap();
    }

    let sync = SettingsSynchronizer::new(Arc::new(SqliteStore::open(&path).unwrap()));
    let loaded = sync.load().await;
    assert_eq!(loaded.long_break_after, 3);
    assert!(!loaded.sound_enabled);
    assert_eq!(loaded.focus_minutes, 25);
}

#[tokio::test]
async fn out_of_range_update_leaves_store_untouched() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let sync = SettingsSynchronizer::new(store);
    sync.load().await;

    assert!(sync
        .update(&TimerSettingsPatch {
            long_break_after: Some(11),
            ..TimerSettingsPatch::default()
        })
        .await
        .is_err());
    assert_eq!(sync.load().await, TimerSettings::default());
}
