use super::actor::{SettingsActor, SettingsActorHandle};
use super::models::{GuildSettings, SettingsField};
use crate::components::storage::StorageBackend;
use crate::error::BotResult;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Handle for interacting with the settings actor
#[derive(Clone)]
pub struct SettingsHandle {
    actor_handle: SettingsActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl SettingsHandle {
    /// Create a new SettingsHandle and spawn the actor
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        let (mut actor, handle) = SettingsActor::new(backend);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Settings for a guild; a default record if the guild never configured anything
    pub async fn get(&self, guild_id: u64) -> GuildSettings {
        match self.actor_handle.get(guild_id).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Settings unavailable for guild {}: {}", guild_id, e);
                GuildSettings::new(guild_id)
            }
        }
    }

    /// Every configured guild, ordered by guild id
    pub async fn get_all(&self) -> BotResult<Vec<GuildSettings>> {
        self.actor_handle.get_all().await
    }

    /// Write one field; setting a field to its current value is a no-op
    pub async fn set(&self, guild_id: u64, field: SettingsField) -> BotResult<GuildSettings> {
        self.actor_handle.set(guild_id, field).await
    }

    pub async fn toggle_ping_everyone(&self, guild_id: u64) -> BotResult<GuildSettings> {
        self.actor_handle.toggle_ping_everyone(guild_id).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        self.actor_handle.shutdown().await
    }
}
