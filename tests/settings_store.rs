mod common;

use common::MockStorage;
use foxbot::components::guild_settings::{SettingsField, SettingsHandle};
use foxbot::components::storage::JsonFileBackend;
use foxbot::error::Error;
use std::sync::Arc;

#[tokio::test]
async fn unknown_guild_gets_defaults() {
    let store = SettingsHandle::new(MockStorage::new());

    let settings = store.get(1234).await;
    assert_eq!(settings.guild_id, 1234);
    assert_eq!(settings.notification_channel_id, None);
    assert_eq!(settings.calendar_url, None);
    assert!(settings.ping_everyone);

    // Reading never creates a record
    assert!(store.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn repeated_set_keeps_one_record() {
    let backend = MockStorage::new();
    let store = SettingsHandle::new(backend.clone());

    for _ in 0..3 {
        store
            .set(42, SettingsField::NotificationChannel(Some(900)))
            .await
            .unwrap();
    }

    let all = store.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].notification_channel_id, Some(900));
    assert_eq!(backend.settings_writes(), 1);
    assert_eq!(
        backend.stored_settings(42).await.unwrap().notification_channel_id,
        Some(900)
    );
}

#[tokio::test]
async fn failed_write_leaves_settings_unchanged() {
    let backend = MockStorage::new();
    let store = SettingsHandle::new(backend.clone());

    store
        .set(7, SettingsField::CalendarUrl(Some("https://old.example.com/cal.ics".into())))
        .await
        .unwrap();

    backend.fail_writes(true);
    let err = store
        .set(7, SettingsField::CalendarUrl(Some("https://new.example.com/cal.ics".into())))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Storage(_)));

    let err = store.toggle_ping_everyone(7).await.unwrap_err();
    assert!(matches!(err, Error::Storage(_)));

    let settings = store.get(7).await;
    assert_eq!(
        settings.calendar_url.as_deref(),
        Some("https://old.example.com/cal.ics")
    );
    assert!(settings.ping_everyone);
}

#[tokio::test]
async fn toggle_flips_the_flag() {
    let store = SettingsHandle::new(MockStorage::new());

    assert!(!store.toggle_ping_everyone(5).await.unwrap().ping_everyone);
    assert!(store.toggle_ping_everyone(5).await.unwrap().ping_everyone);
    assert!(store.get(5).await.ping_everyone);
}

#[tokio::test]
async fn get_all_is_ordered_by_guild() {
    let store = SettingsHandle::new(MockStorage::new());

    for guild_id in [30, 10, 20] {
        store
            .set(guild_id, SettingsField::PingEveryone(false))
            .await
            .unwrap();
    }

    let ids: Vec<u64> = store
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.guild_id)
        .collect();
    assert_eq!(ids, vec![10, 20, 30]);
}

#[tokio::test]
async fn json_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let store = SettingsHandle::new(Arc::new(JsonFileBackend::new(dir.path())));
    store
        .set(99, SettingsField::NotificationChannel(Some(1)))
        .await
        .unwrap();
    store.set(99, SettingsField::PingEveryone(false)).await.unwrap();
    store.shutdown().await.unwrap();

    let reopened = SettingsHandle::new(Arc::new(JsonFileBackend::new(dir.path())));
    let settings = reopened.get(99).await;
    assert_eq!(settings.notification_channel_id, Some(1));
    assert!(!settings.ping_everyone);
}
