mod common;

use common::{date, event, snapshot, MockStorage, FEED_URL};
use foxbot::commands::get_all_application_commands;
use foxbot::components::school_calendar::{feed_urls, CalendarHandle, EventCategory};
use foxbot::components::{AppContext, SettingsHandle};
use foxbot::components::guild_settings::SettingsField;
use foxbot::config::Config;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

fn test_config(ical_url: Option<&str>) -> Config {
    let mut vars = HashMap::new();
    vars.insert("DISCORD_TOKEN", "test-token".to_string());
    if let Some(url) = ical_url {
        vars.insert("ICAL_URL", url.to_string());
    }
    Config::from_vars(|key| vars.get(key).cloned()).unwrap()
}

fn app(config: Config) -> AppContext {
    AppContext::new(
        Arc::new(RwLock::new(config)),
        SettingsHandle::new(MockStorage::new()),
        CalendarHandle::new(MockStorage::new()),
    )
}

/// Smoke test to verify that the config can be built
#[tokio::test]
async fn test_config_loads() {
    let config = test_config(Some(FEED_URL));
    assert_eq!(config.discord_token, "test-token");
    assert_eq!(config.default_calendar_url.as_deref(), Some(FEED_URL));
    assert_eq!(config.bot_locale, "en");
}

/// Every command builds and carries a description
#[test]
fn test_commands_register() {
    let commands = get_all_application_commands();
    assert!(!commands.is_empty());
    for command in commands {
        assert!(command.description.is_some(), "/{} has no description", command.name);
    }
}

#[tokio::test]
async fn test_feed_resolution() {
    let app = app(test_config(Some(FEED_URL)));

    assert_eq!(app.feed_url_for(Some(1)).await.as_deref(), Some(FEED_URL));
    assert_eq!(app.feed_url_for(None).await.as_deref(), Some(FEED_URL));

    app.settings
        .set(1, SettingsField::CalendarUrl(Some("https://own.example.com/cal.ics".into())))
        .await
        .unwrap();
    assert_eq!(
        app.feed_url_for(Some(1)).await.as_deref(),
        Some("https://own.example.com/cal.ics")
    );

    let urls = feed_urls(&app.settings.get_all().await.unwrap(), Some(FEED_URL));
    assert_eq!(urls.len(), 2);

    let unconfigured = self::app(test_config(None));
    assert!(unconfigured.feed_url_for(Some(1)).await.is_none());
}

#[tokio::test]
async fn test_failed_refresh_all_keeps_data() {
    let url = "http://127.0.0.1:1/calendar.ics";
    let app = app(test_config(Some(url)));
    app.calendar
        .install_snapshot(snapshot(
            url,
            vec![event(date(2025, 12, 5), EventCategory::DressDay, "Dress Day")],
        ))
        .await
        .unwrap();

    let results = app.refresh_all_feeds().await;
    assert_eq!(results.len(), 1);
    assert!(results[0].1.is_err());
    assert_eq!(app.calendar.snapshot(url).await.unwrap().len(), 1);

    app.shutdown().await;
}

#[tokio::test]
async fn test_refresh_all_drops_unused_feeds() {
    let default_url = "http://127.0.0.1:1/default.ics";
    let old_url = "http://127.0.0.1:1/old.ics";
    let calendar_backend = MockStorage::new();
    let app = AppContext::new(
        Arc::new(RwLock::new(test_config(Some(default_url)))),
        SettingsHandle::new(MockStorage::new()),
        CalendarHandle::new(calendar_backend.clone()),
    );

    app.settings
        .set(1, SettingsField::CalendarUrl(Some(old_url.into())))
        .await
        .unwrap();
    for url in [default_url, old_url] {
        app.calendar
            .install_snapshot(snapshot(
                url,
                vec![event(date(2025, 12, 5), EventCategory::DressDay, "Dress Day")],
            ))
            .await
            .unwrap();
    }

    app.settings
        .set(1, SettingsField::CalendarUrl(Some("http://127.0.0.1:1/new.ics".into())))
        .await
        .unwrap();
    let results = app.refresh_all_feeds().await;
    assert_eq!(results.len(), 2);

    assert!(app.calendar.snapshot(old_url).await.is_none());
    assert!(calendar_backend.stored_snapshot(old_url).await.is_none());
    // Still referenced, so its last good data stays even though the fetch failed
    assert_eq!(app.calendar.snapshot(default_url).await.unwrap().len(), 1);
    assert!(calendar_backend.stored_snapshot(default_url).await.is_some());

    app.shutdown().await;
}
