use super::actor::{CalendarActor, CalendarActorHandle};
use super::models::CalendarSnapshot;
use super::source::fetch_calendar;
use crate::components::guild_settings::GuildSettings;
use crate::components::storage::StorageBackend;
use crate::error::BotResult;
use chrono::Utc;
use futures::future::join_all;
use reqwest::Client;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Handle for fetching feeds and reading the current snapshots
#[derive(Clone)]
pub struct CalendarHandle {
    actor_handle: CalendarActorHandle,
    client: Client,
    _actor_task: Arc<JoinHandle<()>>,
}

impl CalendarHandle {
    /// Create a new CalendarHandle and spawn the actor
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        let (mut actor, handle) = CalendarActor::new(backend);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("foxbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            actor_handle: handle,
            client,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Fetch a feed and replace its snapshot. On failure the previous snapshot stays.
    pub async fn refresh(&self, url: &str) -> BotResult<usize> {
        // Fetch outside the actor so queries are never blocked on the network
        let events = match fetch_calendar(&self.client, url).await {
            Ok(events) => events,
            Err(e) => {
                warn!("Calendar refresh for {} failed, keeping previous data: {}", url, e);
                return Err(e);
            }
        };

        let count = self
            .install_snapshot(CalendarSnapshot::new(url, events, Utc::now()))
            .await?;
        info!("Refreshed {}: {} matching events", url, count);
        Ok(count)
    }

    /// Refresh several feeds concurrently
    pub async fn refresh_all<I>(&self, urls: I) -> Vec<(String, BotResult<usize>)>
    where
        I: IntoIterator<Item = String>,
    {
        join_all(urls.into_iter().map(|url| async move {
            let result = self.refresh(&url).await;
            (url, result)
        }))
        .await
    }

    /// Replace a feed's snapshot wholesale
    pub async fn install_snapshot(&self, snapshot: CalendarSnapshot) -> BotResult<usize> {
        self.actor_handle.replace_snapshot(snapshot).await
    }

    /// Forget snapshots of feeds outside `urls`
    pub async fn retain_feeds(&self, urls: &BTreeSet<String>) -> BotResult<Vec<String>> {
        self.actor_handle.retain_feeds(urls.clone()).await
    }

    /// Current snapshot of a feed
    pub async fn snapshot(&self, url: &str) -> Option<Arc<CalendarSnapshot>> {
        match self.actor_handle.get_snapshot(url).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Calendar data unavailable: {}", e);
                None
            }
        }
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        self.actor_handle.shutdown().await
    }
}

/// Every distinct feed in use: guild overrides plus the default
pub fn feed_urls(settings: &[GuildSettings], default_url: Option<&str>) -> BTreeSet<String> {
    settings
        .iter()
        .filter_map(|s| s.calendar_url.clone())
        .chain(default_url.map(str::to_string))
        .collect()
}
