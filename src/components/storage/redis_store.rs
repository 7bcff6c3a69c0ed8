use super::StorageBackend;
use crate::components::guild_settings::models::GuildSettings;
use crate::components::school_calendar::models::CalendarSnapshot;
use crate::error::{storage_error, BotResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client as RedisClient};
use tracing::{info, warn};

// Redis key constants
pub mod keys {
    pub const GUILD_SETTINGS: &str = "foxbot:guild_settings";
    pub const CALENDAR_SNAPSHOTS: &str = "foxbot:calendar_snapshots";
}

/// Stores guild records and snapshots as JSON values in two Redis hashes
#[derive(Clone)]
pub struct RedisBackend {
    connection: ConnectionManager,
}

impl RedisBackend {
    /// Connect to Redis; the connection manager reconnects on its own afterwards
    pub async fn connect(redis_url: &str) -> BotResult<Self> {
        let client = RedisClient::open(redis_url)
            .map_err(|e| storage_error(&format!("Failed to create Redis client: {}", e)))?;
        let connection = client
            .get_connection_manager()
            .await
            .map_err(|e| storage_error(&format!("Failed to connect to Redis: {}", e)))?;

        info!("Connected to Redis");
        Ok(Self { connection })
    }

    async fn hash_values(&self, key: &str) -> BotResult<Vec<String>> {
        let mut conn = self.connection.clone();
        let values: Vec<String> = conn.hvals(key).await?;
        Ok(values)
    }

    async fn hash_set(&self, key: &str, field: &str, value: String) -> BotResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.hset(key, field, value).await?;
        Ok(())
    }

    async fn hash_delete(&self, key: &str, field: &str) -> BotResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.hdel(key, field).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn load_settings(&self) -> BotResult<Vec<GuildSettings>> {
        let values = self.hash_values(keys::GUILD_SETTINGS).await?;
        let mut settings = Vec::with_capacity(values.len());
        for value in values {
            settings.push(serde_json::from_str(&value)?);
        }
        Ok(settings)
    }

    async fn save_settings(&self, settings: &GuildSettings) -> BotResult<()> {
        let json = serde_json::to_string(settings)?;
        self.hash_set(keys::GUILD_SETTINGS, &settings.guild_id.to_string(), json)
            .await
    }

    async fn load_snapshots(&self) -> BotResult<Vec<CalendarSnapshot>> {
        let values = self.hash_values(keys::CALENDAR_SNAPSHOTS).await?;
        let mut snapshots = Vec::with_capacity(values.len());
        for value in values {
            // A stale cache entry is not worth failing startup over
            match serde_json::from_str(&value) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => warn!("Ignoring unreadable cached snapshot: {}", e),
            }
        }
        Ok(snapshots)
    }

    async fn save_snapshot(&self, snapshot: &CalendarSnapshot) -> BotResult<()> {
        let json = serde_json::to_string(snapshot)?;
        self.hash_set(keys::CALENDAR_SNAPSHOTS, &snapshot.url, json)
            .await
    }

    async fn remove_snapshot(&self, url: &str) -> BotResult<()> {
        self.hash_delete(keys::CALENDAR_SNAPSHOTS, url).await
    }
}
