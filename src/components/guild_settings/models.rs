use serde::{Deserialize, Serialize};

/// Per-guild bot configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSettings {
    pub guild_id: u64,
    #[serde(default)]
    pub notification_channel_id: Option<u64>,
    #[serde(default)]
    pub calendar_url: Option<String>,
    #[serde(default = "default_ping_everyone")]
    pub ping_everyone: bool,
}

fn default_ping_everyone() -> bool {
    true
}

impl GuildSettings {
    /// The record a guild has before any admin has configured it
    pub fn new(guild_id: u64) -> Self {
        Self {
            guild_id,
            notification_channel_id: None,
            calendar_url: None,
            ping_everyone: default_ping_everyone(),
        }
    }

    /// The guild's own feed, falling back to the bot-wide default
    pub fn feed_url(&self, default_url: Option<&str>) -> Option<String> {
        self.calendar_url
            .as_deref()
            .or(default_url)
            .map(str::to_string)
    }

    /// Apply a single field update
    pub fn apply(&mut self, field: SettingsField) {
        match field {
            SettingsField::NotificationChannel(channel) => self.notification_channel_id = channel,
            SettingsField::CalendarUrl(url) => self.calendar_url = url,
            SettingsField::PingEveryone(enabled) => self.ping_everyone = enabled,
        }
    }
}

/// One writable field of `GuildSettings`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsField {
    NotificationChannel(Option<u64>),
    CalendarUrl(Option<String>),
    PingEveryone(bool),
}
