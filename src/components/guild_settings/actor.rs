use super::models::{GuildSettings, SettingsField};
use crate::components::storage::StorageBackend;
use crate::error::{component_error, BotResult};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

/// The settings actor: sole owner and writer of the guild records
pub struct SettingsActor {
    backend: Arc<dyn StorageBackend>,
    settings: BTreeMap<u64, GuildSettings>,
    command_rx: mpsc::Receiver<SettingsCommand>,
}

/// Commands that can be sent to the settings actor
pub enum SettingsCommand {
    Get(u64, mpsc::Sender<GuildSettings>),
    GetAll(mpsc::Sender<Vec<GuildSettings>>),
    Set(u64, SettingsField, mpsc::Sender<BotResult<GuildSettings>>),
    TogglePingEveryone(u64, mpsc::Sender<BotResult<GuildSettings>>),
    Shutdown,
}

/// Handle for communicating with the settings actor
#[derive(Clone)]
pub struct SettingsActorHandle {
    command_tx: mpsc::Sender<SettingsCommand>,
}

impl SettingsActorHandle {
    pub async fn get(&self, guild_id: u64) -> BotResult<GuildSettings> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(SettingsCommand::Get(guild_id, response_tx))
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Response channel closed"))
    }

    pub async fn get_all(&self) -> BotResult<Vec<GuildSettings>> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(SettingsCommand::GetAll(response_tx))
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Response channel closed"))
    }

    pub async fn set(&self, guild_id: u64, field: SettingsField) -> BotResult<GuildSettings> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(SettingsCommand::Set(guild_id, field, response_tx))
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Response channel closed"))?
    }

    pub async fn toggle_ping_everyone(&self, guild_id: u64) -> BotResult<GuildSettings> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(SettingsCommand::TogglePingEveryone(guild_id, response_tx))
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Response channel closed"))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        let _ = self.command_tx.send(SettingsCommand::Shutdown).await;
        Ok(())
    }
}

impl SettingsActor {
    /// Create a new actor and return its handle
    pub fn new(backend: Arc<dyn StorageBackend>) -> (Self, SettingsActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            backend,
            settings: BTreeMap::new(),
            command_rx,
        };

        (actor, SettingsActorHandle { command_tx })
    }

    /// Load stored records, then process commands until shutdown
    pub async fn run(&mut self) {
        info!("Settings actor started ({} backend)", self.backend.name());

        match self.backend.load_settings().await {
            Ok(stored) => {
                info!("Loaded settings for {} guilds", stored.len());
                self.settings = stored.into_iter().map(|s| (s.guild_id, s)).collect();
            }
            Err(e) => error!("Failed to load guild settings, starting empty: {}", e),
        }

        // Commands are handled one at a time, so every write is flushed before the next read
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                SettingsCommand::Get(guild_id, response_tx) => {
                    let _ = response_tx.send(self.current(guild_id)).await;
                }
                SettingsCommand::GetAll(response_tx) => {
                    let all = self.settings.values().cloned().collect();
                    let _ = response_tx.send(all).await;
                }
                SettingsCommand::Set(guild_id, field, response_tx) => {
                    let mut updated = self.current(guild_id);
                    updated.apply(field);
                    let result = self.store(updated).await;
                    let _ = response_tx.send(result).await;
                }
                SettingsCommand::TogglePingEveryone(guild_id, response_tx) => {
                    let mut updated = self.current(guild_id);
                    updated.ping_everyone = !updated.ping_everyone;
                    let result = self.store(updated).await;
                    let _ = response_tx.send(result).await;
                }
                SettingsCommand::Shutdown => {
                    info!("Settings actor shutting down");
                    break;
                }
            }
        }

        info!("Settings actor shut down");
    }

    fn current(&self, guild_id: u64) -> GuildSettings {
        self.settings
            .get(&guild_id)
            .cloned()
            .unwrap_or_else(|| GuildSettings::new(guild_id))
    }

    /// Persist first; memory only changes once the backend accepted the write
    async fn store(&mut self, updated: GuildSettings) -> BotResult<GuildSettings> {
        if self.settings.get(&updated.guild_id) == Some(&updated) {
            return Ok(updated);
        }

        self.backend.save_settings(&updated).await?;
        self.settings.insert(updated.guild_id, updated.clone());
        Ok(updated)
    }
}
