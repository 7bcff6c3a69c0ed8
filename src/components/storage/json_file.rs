use super::StorageBackend;
use crate::components::guild_settings::models::GuildSettings;
use crate::components::school_calendar::models::CalendarSnapshot;
use crate::error::{storage_error, BotResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const SETTINGS_FILE: &str = "settings.json";
const EVENTS_FILE: &str = "events.json";

/// Stores everything as pretty-printed JSON maps under a data directory
#[derive(Debug)]
pub struct JsonFileBackend {
    dir: PathBuf,
    // Serializes read-modify-write cycles on the files
    write_lock: Mutex<()>,
}

impl JsonFileBackend {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Read a JSON map; a missing file is an empty map
    async fn read_map<V: DeserializeOwned>(&self, file: &str) -> BotResult<BTreeMap<String, V>> {
        let path = self.path(file);
        match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| storage_error(&format!("Corrupt {}: {}", path.display(), e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write through a temp file and rename so readers never see a partial file
    async fn write_map<V: Serialize>(&self, file: &str, map: &BTreeMap<String, V>) -> BotResult<()> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.path(file);
        let tmp = self.path(&format!("{}.tmp", file));
        let json = serde_json::to_vec_pretty(map)?;

        let mut handle = fs::File::create(&tmp).await?;
        handle.write_all(&json).await?;
        handle.sync_all().await?;
        drop(handle);

        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn upsert<V>(&self, file: &str, key: String, value: &V) -> BotResult<()>
    where
        V: Serialize + DeserializeOwned + Clone,
    {
        let _guard = self.write_lock.lock().await;
        let mut map: BTreeMap<String, V> = self.read_map(file).await?;
        map.insert(key, value.clone());
        self.write_map(file, &map).await
    }

    async fn remove<V>(&self, file: &str, key: &str) -> BotResult<()>
    where
        V: Serialize + DeserializeOwned,
    {
        let _guard = self.write_lock.lock().await;
        let mut map: BTreeMap<String, V> = self.read_map(file).await?;
        if map.remove(key).is_none() {
            return Ok(());
        }
        self.write_map(file, &map).await
    }
}

#[async_trait]
impl StorageBackend for JsonFileBackend {
    fn name(&self) -> &'static str {
        "json_file"
    }

    async fn load_settings(&self) -> BotResult<Vec<GuildSettings>> {
        let map: BTreeMap<String, GuildSettings> = self.read_map(SETTINGS_FILE).await?;
        Ok(map.into_values().collect())
    }

    async fn save_settings(&self, settings: &GuildSettings) -> BotResult<()> {
        self.upsert(SETTINGS_FILE, settings.guild_id.to_string(), settings)
            .await
    }

    async fn load_snapshots(&self) -> BotResult<Vec<CalendarSnapshot>> {
        let map: BTreeMap<String, CalendarSnapshot> = self.read_map(EVENTS_FILE).await?;
        Ok(map.into_values().collect())
    }

    async fn save_snapshot(&self, snapshot: &CalendarSnapshot) -> BotResult<()> {
        self.upsert(EVENTS_FILE, snapshot.url.clone(), snapshot).await
    }

    async fn remove_snapshot(&self, url: &str) -> BotResult<()> {
        self.remove::<CalendarSnapshot>(EVENTS_FILE, url).await
    }
}
