//! Hand-written test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use foxbot::components::guild_settings::GuildSettings;
use foxbot::components::school_calendar::{
    CalendarEvent, CalendarSnapshot, EventCategory, NotificationSink, Reminder,
};
use foxbot::components::storage::StorageBackend;
use foxbot::error::{send_error, storage_error, BotResult};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

pub const FEED_URL: &str = "https://school.example.com/calendar.ics";

/// In-memory storage backend that can be told to reject writes
#[derive(Debug, Default)]
pub struct MockStorage {
    settings: Mutex<BTreeMap<u64, GuildSettings>>,
    snapshots: Mutex<BTreeMap<String, CalendarSnapshot>>,
    fail_writes: AtomicBool,
    settings_writes: AtomicUsize,
}

impl MockStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of settings writes that reached the backend
    pub fn settings_writes(&self) -> usize {
        self.settings_writes.load(Ordering::SeqCst)
    }

    pub async fn stored_settings(&self, guild_id: u64) -> Option<GuildSettings> {
        self.settings.lock().await.get(&guild_id).cloned()
    }

    pub async fn stored_snapshot(&self, url: &str) -> Option<CalendarSnapshot> {
        self.snapshots.lock().await.get(url).cloned()
    }
}

#[async_trait]
impl StorageBackend for MockStorage {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn load_settings(&self) -> BotResult<Vec<GuildSettings>> {
        Ok(self.settings.lock().await.values().cloned().collect())
    }

    async fn save_settings(&self, settings: &GuildSettings) -> BotResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(storage_error("disk full"));
        }
        self.settings_writes.fetch_add(1, Ordering::SeqCst);
        self.settings
            .lock()
            .await
            .insert(settings.guild_id, settings.clone());
        Ok(())
    }

    async fn load_snapshots(&self) -> BotResult<Vec<CalendarSnapshot>> {
        Ok(self.snapshots.lock().await.values().cloned().collect())
    }

    async fn save_snapshot(&self, snapshot: &CalendarSnapshot) -> BotResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(storage_error("disk full"));
        }
        self.snapshots
            .lock()
            .await
            .insert(snapshot.url.clone(), snapshot.clone());
        Ok(())
    }

    async fn remove_snapshot(&self, url: &str) -> BotResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(storage_error("disk full"));
        }
        self.snapshots.lock().await.remove(url);
        Ok(())
    }
}

/// Records reminders instead of posting them
#[derive(Debug, Default)]
pub struct MockSink {
    delivered: Mutex<Vec<(u64, Reminder)>>,
    failing_channels: HashSet<u64>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose deliveries to `channels` fail
    pub fn failing_on(channels: &[u64]) -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            failing_channels: channels.iter().copied().collect(),
        }
    }

    pub async fn delivered(&self) -> Vec<(u64, Reminder)> {
        self.delivered.lock().await.clone()
    }

    pub async fn delivered_to(&self, channel_id: u64) -> Option<Reminder> {
        self.delivered
            .lock()
            .await
            .iter()
            .find(|(channel, _)| *channel == channel_id)
            .map(|(_, reminder)| reminder.clone())
    }
}

#[async_trait]
impl NotificationSink for MockSink {
    async fn deliver(&self, channel_id: u64, reminder: &Reminder) -> BotResult<()> {
        if self.failing_channels.contains(&channel_id) {
            return Err(send_error(&format!("Missing Access in channel {}", channel_id)));
        }
        self.delivered
            .lock()
            .await
            .push((channel_id, reminder.clone()));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn event(date: NaiveDate, category: EventCategory, label: &str) -> CalendarEvent {
    CalendarEvent {
        date,
        category,
        label: label.to_string(),
    }
}

pub fn snapshot(url: &str, events: Vec<CalendarEvent>) -> CalendarSnapshot {
    CalendarSnapshot::new(url, events, Utc::now())
}

/// Serve one HTTP response on a local port and return the URL to fetch
pub async fn serve_once(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/calendar\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
    });

    format!("http://{}/school.ics", addr)
}

/// A small feed: one event per category plus entries that must be dropped
pub const SCHOOL_FEED: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example High//Calendar//EN\r\n\
BEGIN:VEVENT\r\n\
UID:a\r\n\
SUMMARY:Hall: Grade 10 Assembly\r\n\
DTSTART;VALUE=DATE:20251202\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:b\r\n\
SUMMARY:Late Start\r\n\
DTSTART;VALUE=DATE:20251203\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:c\r\n\
SUMMARY:Dress Day - Ugly Sweater\r\n\
DTSTART;VALUE=DATE:20251205\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:d\r\n\
SUMMARY:Extended Homeroom\r\n\
DTSTART:20251208T083000Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:e\r\n\
SUMMARY:Basketball game\r\n\
DTSTART;VALUE=DATE:20251204\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
