use crate::config::Config;
use crate::error::BotResult;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use poise::serenity_prelude as serenity;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

// Export components
pub mod guild_settings;
pub mod school_calendar;
pub mod storage;

pub use guild_settings::SettingsHandle;
pub use school_calendar::CalendarHandle;

/// Shared state handed to commands and background components
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<RwLock<Config>>,
    pub settings: SettingsHandle,
    pub calendar: CalendarHandle,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

impl AppContext {
    pub fn new(config: Arc<RwLock<Config>>, settings: SettingsHandle, calendar: CalendarHandle) -> Self {
        Self {
            config,
            settings,
            calendar,
        }
    }

    pub async fn default_calendar_url(&self) -> Option<String> {
        self.config.read().await.default_calendar_url.clone()
    }

    /// Feed a guild reads from: its own URL, else the default
    pub async fn feed_url_for(&self, guild_id: Option<u64>) -> Option<String> {
        let default_url = self.default_calendar_url().await;
        match guild_id {
            Some(id) => self.settings.get(id).await.feed_url(default_url.as_deref()),
            None => default_url,
        }
    }

    /// Today's date in the configured timezone
    pub async fn today(&self) -> NaiveDate {
        let timezone = self.config.read().await.timezone;
        Utc::now().with_timezone(&timezone).date_naive()
    }

    /// Refresh every feed referenced by a guild or by the default, and drop
    /// the data of feeds that are no longer referenced
    pub async fn refresh_all_feeds(&self) -> Vec<(String, BotResult<usize>)> {
        let default_url = self.default_calendar_url().await;
        let urls = match self.settings.get_all().await {
            Ok(guilds) => {
                let urls = school_calendar::feed_urls(&guilds, default_url.as_deref());
                if let Err(e) = self.calendar.retain_feeds(&urls).await {
                    error!("Could not drop unused calendar data: {}", e);
                }
                urls
            }
            Err(e) => {
                // Without the guild list we cannot tell which feeds are unused
                error!("Could not list guild settings for refresh: {}", e);
                school_calendar::feed_urls(&[], default_url.as_deref())
            }
        };

        self.calendar.refresh_all(urls).await
    }

    /// Stop both actors
    pub async fn shutdown(&self) {
        if let Err(e) = self.settings.shutdown().await {
            error!("Error shutting down settings store: {:?}", e);
        }
        if let Err(e) = self.calendar.shutdown().await {
            error!("Error shutting down calendar store: {:?}", e);
        }
    }
}

/// Component trait that all background components must implement
#[async_trait]
pub trait Component: Send + Sync {
    /// Get the name of the component
    fn name(&self) -> &'static str;

    /// Initialize the component once the gateway is ready
    async fn init(&self, http: Arc<serenity::Http>, app: AppContext) -> BotResult<()>;

    /// Shutdown the component
    async fn shutdown(&self) -> BotResult<()>;
}

/// Manager for all components
pub struct ComponentManager {
    components: Vec<Box<dyn Component>>,
    config: Arc<RwLock<Config>>,
}

impl fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentManager")
            .field("component_count", &self.components.len())
            .field("config", &self.config)
            .finish()
    }
}

impl ComponentManager {
    /// Create a new component manager
    pub fn new(config: Arc<RwLock<Config>>) -> Self {
        Self {
            components: Vec::new(),
            config,
        }
    }

    /// Register a component unless `config/components.toml` disables it
    pub async fn register<T: Component + 'static>(&mut self, component: T) {
        if !self.config.read().await.is_component_enabled(component.name()) {
            info!("Component {} is disabled, not registering", component.name());
            return;
        }
        info!("Registering component: {}", component.name());
        self.components.push(Box::new(component));
    }

    /// Initialize all registered components
    pub async fn init_all(&self, http: Arc<serenity::Http>, app: AppContext) -> BotResult<()> {
        for component in &self.components {
            info!("Initializing component: {}", component.name());

            if let Err(e) = component.init(Arc::clone(&http), app.clone()).await {
                // Log error but continue with other components
                error!("Error initializing component {}: {:?}", component.name(), e);
            }
        }

        Ok(())
    }

    /// Shutdown all components
    pub async fn shutdown_all(&self) -> BotResult<()> {
        info!("Shutting down all components");

        for component in &self.components {
            info!("Shutting down component: {}", component.name());

            if let Err(e) = component.shutdown().await {
                // Log error but continue with other components
                error!("Error shutting down component {}: {:?}", component.name(), e);
            }
        }

        Ok(())
    }
}
