use super::handle::CalendarHandle;
use super::models::CalendarEvent;
use crate::components::guild_settings::SettingsHandle;
use crate::error::{send_error, BotResult};
use crate::utils::time::format_date;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use poise::serenity_prelude::{self as serenity, ChannelId, CreateAllowedMentions, CreateEmbed, CreateMessage};
use rust_i18n::t;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Color of the reminder embed
const REMINDER_COLOR: u32 = 0xE7_4C_3C;

/// One guild's message about tomorrow's events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub date: NaiveDate,
    pub events: Vec<CalendarEvent>,
    pub mention_everyone: bool,
}

impl Reminder {
    /// Plain-text part of the message; starts with `@everyone` when pinging
    pub fn content(&self) -> String {
        if self.mention_everyone {
            t!("reminder_everyone_greeting").to_string()
        } else {
            t!("reminder_greeting").to_string()
        }
    }

    pub fn embed(&self) -> CreateEmbed {
        let mut embed = CreateEmbed::new()
            .title(t!("reminder_title", date = format_date(self.date)))
            .color(REMINDER_COLOR);

        for event in &self.events {
            embed = embed.field(
                t!(
                    "reminder_field",
                    emoji = event.category.emoji(),
                    category = event.category.display_name()
                ),
                event.label.clone(),
                false,
            );
        }

        embed
    }

    pub fn to_message(&self) -> CreateMessage {
        CreateMessage::new()
            .content(self.content())
            .embed(self.embed())
            .allowed_mentions(CreateAllowedMentions::new().everyone(self.mention_everyone))
    }
}

/// Build the reminder for one guild, or `None` on a quiet day
pub fn compose_reminder(date: NaiveDate, events: &[CalendarEvent], ping_everyone: bool) -> Option<Reminder> {
    if events.is_empty() {
        return None;
    }

    let important = events.iter().any(|event| event.category.is_important());

    Some(Reminder {
        date,
        events: events.to_vec(),
        mention_everyone: ping_everyone && important,
    })
}

/// Where reminders are posted
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, channel_id: u64, reminder: &Reminder) -> BotResult<()>;
}

/// Posts reminders through the Discord REST API
pub struct DiscordSink {
    http: Arc<serenity::Http>,
}

impl DiscordSink {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl NotificationSink for DiscordSink {
    async fn deliver(&self, channel_id: u64, reminder: &Reminder) -> BotResult<()> {
        ChannelId::new(channel_id)
            .send_message(self.http.as_ref(), reminder.to_message())
            .await
            .map_err(|e| send_error(&format!("channel {}: {}", channel_id, e)))?;
        Ok(())
    }
}

/// Outcome of one notification pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Guilds that received a reminder
    pub sent: Vec<u64>,
    /// Guilds whose reminder could not be delivered
    pub failed: Vec<u64>,
    /// Guilds without a channel, without calendar data, or with nothing tomorrow
    pub skipped: Vec<u64>,
}

/// Send tomorrow's reminders to every guild with a notification channel.
///
/// Each guild is handled on its own: a failed delivery is logged and the pass moves on.
pub async fn run_notification_pass(
    today: NaiveDate,
    default_url: Option<&str>,
    settings: &SettingsHandle,
    calendar: &CalendarHandle,
    sink: &dyn NotificationSink,
) -> BotResult<PassReport> {
    let tomorrow = today + Duration::days(1);
    let mut report = PassReport::default();

    for guild in settings.get_all().await? {
        let Some(channel_id) = guild.notification_channel_id else {
            report.skipped.push(guild.guild_id);
            continue;
        };

        let Some(url) = guild.feed_url(default_url) else {
            debug!("Guild {} has no calendar configured", guild.guild_id);
            report.skipped.push(guild.guild_id);
            continue;
        };

        let Some(snapshot) = calendar.snapshot(&url).await else {
            debug!("No calendar data yet for guild {} ({})", guild.guild_id, url);
            report.skipped.push(guild.guild_id);
            continue;
        };

        let events = snapshot.events_on(tomorrow);
        let Some(reminder) = compose_reminder(tomorrow, &events, guild.ping_everyone) else {
            report.skipped.push(guild.guild_id);
            continue;
        };

        match sink.deliver(channel_id, &reminder).await {
            Ok(()) => {
                info!(
                    "Sent reminder for {} ({} events) to guild {}",
                    tomorrow,
                    reminder.events.len(),
                    guild.guild_id
                );
                report.sent.push(guild.guild_id);
            }
            Err(e) => {
                warn!("Failed to deliver reminder to guild {}: {}", guild.guild_id, e);
                report.failed.push(guild.guild_id);
            }
        }
    }

    Ok(report)
}
