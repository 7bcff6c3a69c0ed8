use super::models::CalendarSnapshot;
use crate::components::storage::StorageBackend;
use crate::error::{component_error, BotResult};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// The calendar actor: owns the current snapshot of every feed
pub struct CalendarActor {
    backend: Arc<dyn StorageBackend>,
    snapshots: HashMap<String, Arc<CalendarSnapshot>>,
    command_rx: mpsc::Receiver<CalendarCommand>,
}

/// Commands that can be sent to the calendar actor
pub enum CalendarCommand {
    GetSnapshot(String, mpsc::Sender<Option<Arc<CalendarSnapshot>>>),
    ReplaceSnapshot(CalendarSnapshot, mpsc::Sender<usize>),
    RetainFeeds(BTreeSet<String>, mpsc::Sender<Vec<String>>),
    Shutdown,
}

/// Handle for communicating with the calendar actor
#[derive(Clone)]
pub struct CalendarActorHandle {
    command_tx: mpsc::Sender<CalendarCommand>,
}

impl CalendarActorHandle {
    /// Current snapshot of a feed, if it was ever fetched
    pub async fn get_snapshot(&self, url: impl Into<String>) -> BotResult<Option<Arc<CalendarSnapshot>>> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(CalendarCommand::GetSnapshot(url.into(), response_tx))
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Response channel closed"))
    }

    /// Swap in a freshly fetched snapshot, returning its event count
    pub async fn replace_snapshot(&self, snapshot: CalendarSnapshot) -> BotResult<usize> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(CalendarCommand::ReplaceSnapshot(snapshot, response_tx))
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Response channel closed"))
    }

    /// Drop every snapshot whose URL is not in `urls`, returning the dropped URLs
    pub async fn retain_feeds(&self, urls: BTreeSet<String>) -> BotResult<Vec<String>> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(CalendarCommand::RetainFeeds(urls, response_tx))
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Response channel closed"))
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        let _ = self.command_tx.send(CalendarCommand::Shutdown).await;
        Ok(())
    }
}

impl CalendarActor {
    /// Create a new actor and return its handle
    pub fn new(backend: Arc<dyn StorageBackend>) -> (Self, CalendarActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            backend,
            snapshots: HashMap::new(),
            command_rx,
        };

        (actor, CalendarActorHandle { command_tx })
    }

    /// Restore cached snapshots, then process commands until shutdown
    pub async fn run(&mut self) {
        info!("Calendar actor started");

        match self.backend.load_snapshots().await {
            Ok(cached) => {
                for snapshot in cached {
                    info!(
                        "Loaded {} cached events for {} (fetched {})",
                        snapshot.len(),
                        snapshot.url,
                        snapshot.fetched_at
                    );
                    self.snapshots.insert(snapshot.url.clone(), Arc::new(snapshot));
                }
            }
            Err(e) => warn!("Failed to load cached calendar data: {}", e),
        }

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                CalendarCommand::GetSnapshot(url, response_tx) => {
                    let _ = response_tx.send(self.snapshots.get(&url).cloned()).await;
                }
                CalendarCommand::ReplaceSnapshot(snapshot, response_tx) => {
                    let count = snapshot.len();

                    // The cache only speeds up restarts; a failed write keeps the in-memory data
                    if let Err(e) = self.backend.save_snapshot(&snapshot).await {
                        warn!("Failed to cache calendar data for {}: {}", snapshot.url, e);
                    }

                    self.snapshots.insert(snapshot.url.clone(), Arc::new(snapshot));
                    let _ = response_tx.send(count).await;
                }
                CalendarCommand::RetainFeeds(urls, response_tx) => {
                    let stale: Vec<String> = self
                        .snapshots
                        .keys()
                        .filter(|url| !urls.contains(*url))
                        .cloned()
                        .collect();

                    for url in &stale {
                        self.snapshots.remove(url);
                        if let Err(e) = self.backend.remove_snapshot(url).await {
                            warn!("Failed to drop cached calendar data for {}: {}", url, e);
                        }
                        info!("Dropped calendar data for unused feed {}", url);
                    }

                    let _ = response_tx.send(stale).await;
                }
                CalendarCommand::Shutdown => {
                    info!("Calendar actor shutting down");
                    break;
                }
            }
        }

        info!("Calendar actor shut down");
    }
}
