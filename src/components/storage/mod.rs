mod json_file;
mod redis_store;

pub use json_file::JsonFileBackend;
pub use redis_store::RedisBackend;

use crate::components::guild_settings::models::GuildSettings;
use crate::components::school_calendar::models::CalendarSnapshot;
use crate::config::Config;
use crate::error::BotResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Durable storage for guild settings and the last good calendar snapshots.
///
/// A save call returns only after the write is durable, and a failed save leaves
/// the previously stored value intact.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Every stored guild record
    async fn load_settings(&self) -> BotResult<Vec<GuildSettings>>;

    /// Insert or replace one guild record
    async fn save_settings(&self, settings: &GuildSettings) -> BotResult<()>;

    /// Every cached snapshot, one per feed URL
    async fn load_snapshots(&self) -> BotResult<Vec<CalendarSnapshot>>;

    /// Insert or replace the snapshot for `snapshot.url`
    async fn save_snapshot(&self, snapshot: &CalendarSnapshot) -> BotResult<()>;

    /// Forget the cached snapshot of a feed nobody reads any more
    async fn remove_snapshot(&self, url: &str) -> BotResult<()>;
}

/// Pick the backend the configuration asks for
pub async fn open_backend(config: &Config) -> BotResult<Arc<dyn StorageBackend>> {
    match &config.redis_url {
        Some(redis_url) => {
            info!("Using Redis storage");
            Ok(Arc::new(RedisBackend::connect(redis_url).await?))
        }
        None => {
            info!("Using JSON file storage in {}", config.data_dir.display());
            Ok(Arc::new(JsonFileBackend::new(&config.data_dir)))
        }
    }
}
