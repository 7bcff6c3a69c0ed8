use crate::error::{config_error, env_error, BotResult};
use crate::utils::time::parse_time;
use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Default activity text for the bot
pub const DEFAULT_ACTIVITY: &str = "Watching the school calendar";

/// Reminders go out at 5 PM unless configured otherwise
pub const DEFAULT_NOTIFICATION_TIME: &str = "17:00";

/// Component names understood by `config/components.toml`
pub mod components {
    pub const DAILY_NOTIFIER: &str = "daily_notifier";
    pub const CALENDAR_REFRESHER: &str = "calendar_refresher";
}

/// Target dates for the countdown commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownDates {
    pub midyears: NaiveDate,
    pub winter_break: NaiveDate,
    pub end_of_school: NaiveDate,
}

impl Default for CountdownDates {
    fn default() -> Self {
        Self {
            midyears: NaiveDate::from_ymd_opt(2025, 12, 15).unwrap_or_default(),
            winter_break: NaiveDate::from_ymd_opt(2025, 12, 18).unwrap_or_default(),
            end_of_school: NaiveDate::from_ymd_opt(2026, 5, 29).unwrap_or_default(),
        }
    }
}

/// Main configuration structure for the bot
#[derive(Clone)]
pub struct Config {
    /// Discord bot token
    pub discord_token: String,
    /// Calendar feed used by guilds that have not set their own
    pub default_calendar_url: Option<String>,
    /// Timezone for scheduling and "today"
    pub timezone: Tz,
    /// Wall-clock time of the daily reminder
    pub notification_time: NaiveTime,
    /// Hours between periodic calendar refreshes
    pub calendar_refresh_hours: u64,
    /// Directory for the JSON stores
    pub data_dir: PathBuf,
    /// Use Redis instead of the JSON files when set
    pub redis_url: Option<String>,
    /// Map of component names to their enabled status
    pub components: HashMap<String, bool>,
    /// Bot activity status text
    pub activity: String,
    /// Locale for user-facing strings
    pub bot_locale: String,
    pub countdowns: CountdownDates,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"<redacted>")
            .field("default_calendar_url", &self.default_calendar_url)
            .field("timezone", &self.timezone)
            .field("notification_time", &self.notification_time)
            .field("calendar_refresh_hours", &self.calendar_refresh_hours)
            .field("data_dir", &self.data_dir)
            .field("redis_url", &self.redis_url)
            .field("components", &self.components)
            .field("activity", &self.activity)
            .field("bot_locale", &self.bot_locale)
            .field("countdowns", &self.countdowns)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> BotResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Self::from_vars(|key| env::var(key).ok())?;

        // Load components configuration from file if it exists
        if let Ok(content) = fs::read_to_string("config/components.toml") {
            let file_components = toml::from_str::<HashMap<String, bool>>(&content)?;
            config.components.extend(file_components);
        }

        Ok(config)
    }

    /// Build a configuration from a variable lookup
    pub fn from_vars<F>(var: F) -> BotResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let var = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let discord_token = var("DISCORD_TOKEN").ok_or_else(|| env_error("DISCORD_TOKEN"))?;

        let timezone_str = var("TIMEZONE").unwrap_or_else(|| String::from("UTC"));
        let timezone = timezone_str
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Invalid TIMEZONE: {}", timezone_str)))?;

        let time_str =
            var("NOTIFICATION_TIME").unwrap_or_else(|| String::from(DEFAULT_NOTIFICATION_TIME));
        let notification_time = parse_time(&time_str).ok_or_else(|| {
            config_error(&format!("Invalid NOTIFICATION_TIME (expected HH:MM): {}", time_str))
        })?;

        let calendar_refresh_hours = match var("CALENDAR_REFRESH_HOURS") {
            Some(hours) => hours
                .parse::<u64>()
                .ok()
                .filter(|h| *h > 0)
                .ok_or_else(|| config_error(&format!("Invalid CALENDAR_REFRESH_HOURS: {}", hours)))?,
            None => 24,
        };

        let defaults = CountdownDates::default();
        let countdowns = CountdownDates {
            midyears: parse_date_var(&var, "MIDYEARS_DATE", defaults.midyears)?,
            winter_break: parse_date_var(&var, "WINTER_BREAK_DATE", defaults.winter_break)?,
            end_of_school: parse_date_var(&var, "END_OF_SCHOOL_DATE", defaults.end_of_school)?,
        };

        // Both components are on unless switched off in config/components.toml
        let mut components = HashMap::new();
        components.insert(components::DAILY_NOTIFIER.to_string(), true);
        components.insert(components::CALENDAR_REFRESHER.to_string(), true);

        Ok(Config {
            discord_token,
            default_calendar_url: var("ICAL_URL"),
            timezone,
            notification_time,
            calendar_refresh_hours,
            data_dir: PathBuf::from(var("DATA_DIR").unwrap_or_else(|| String::from("data"))),
            redis_url: var("REDIS_URL"),
            components,
            activity: var("BOT_ACTIVITY").unwrap_or_else(|| String::from(DEFAULT_ACTIVITY)),
            bot_locale: var("BOT_LOCALE").unwrap_or_else(|| String::from("en")),
            countdowns,
        })
    }

    /// Check if a component is enabled
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&false)
    }
}

fn parse_date_var<F>(var: &F, key: &str, default: NaiveDate) -> BotResult<NaiveDate>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .map_err(|_| config_error(&format!("Invalid {} (expected YYYY-MM-DD): {}", key, value))),
        None => Ok(default),
    }
}
