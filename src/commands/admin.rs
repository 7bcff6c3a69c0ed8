use crate::commands::{
    caller_is_admin, create_error_embed, create_success_embed, create_warning_embed, require_guild,
    CommandResult, Context, INFO_COLOR,
};
use crate::components::guild_settings::{GuildSettings, SettingsField, SettingsHandle};
use crate::components::school_calendar::source::validate_url;
use crate::error::{BotResult, Error};
use poise::serenity_prelude::CreateEmbed;
use poise::CreateReply;
use rust_i18n::t;
use tracing::info;

/// Longest calendar URL shown in `/show-settings`
const MAX_URL_DISPLAY: usize = 50;

/// A settings mutation requested by an admin command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsChange {
    Set(SettingsField),
    TogglePingEveryone,
}

/// Apply a settings change on behalf of a member.
///
/// Non-admins get `PermissionDenied` and nothing is written.
pub async fn apply_settings_change(
    store: &SettingsHandle,
    is_admin: bool,
    guild_id: u64,
    change: SettingsChange,
) -> BotResult<GuildSettings> {
    if !is_admin {
        info!("Rejected settings change {:?} in guild {}: not an admin", change, guild_id);
        return Err(Error::PermissionDenied);
    }

    match change {
        SettingsChange::Set(field) => store.set(guild_id, field).await,
        SettingsChange::TogglePingEveryone => store.toggle_ping_everyone(guild_id).await,
    }
}

/// Guild of an admin-only invocation, or `PermissionDenied`
async fn admin_guild(ctx: Context<'_>) -> BotResult<u64> {
    let guild_id = require_guild(ctx)?;
    if !caller_is_admin(ctx).await {
        info!("{} tried /{} without Administrator", ctx.author().name, ctx.command().name);
        return Err(Error::PermissionDenied);
    }
    Ok(guild_id)
}

fn truncate_url(url: &str) -> String {
    if url.chars().count() > MAX_URL_DISPLAY {
        let head: String = url.chars().take(MAX_URL_DISPLAY).collect();
        format!("{}...", head)
    } else {
        url.to_string()
    }
}

/// Name/value rows of the `/show-settings` embed
pub fn settings_fields(
    settings: &GuildSettings,
    default_url: Option<&str>,
    cached_events: Option<usize>,
) -> Vec<(String, String)> {
    let channel = settings
        .notification_channel_id
        .map(|id| format!("<#{}>", id))
        .unwrap_or_else(|| t!("settings_not_set").to_string());

    let calendar_url = match (&settings.calendar_url, default_url) {
        (Some(url), _) => truncate_url(url),
        (None, Some(url)) => t!("settings_default_url", url = truncate_url(url)).to_string(),
        (None, None) => t!("settings_not_set").to_string(),
    };

    let ping_everyone = if settings.ping_everyone {
        t!("settings_enabled")
    } else {
        t!("settings_disabled")
    }
    .to_string();

    vec![
        (t!("settings_channel").to_string(), channel),
        (t!("settings_calendar_url").to_string(), calendar_url),
        (t!("settings_ping_everyone").to_string(), ping_everyone),
        (
            t!("settings_cached_events").to_string(),
            cached_events.unwrap_or(0).to_string(),
        ),
    ]
}

/// Admin replies are only shown to the admin who ran the command
fn admin_reply(embed: CreateEmbed) -> CreateReply {
    CreateReply::default().embed(embed).ephemeral(true)
}

fn settings_embed(fields: Vec<(String, String)>) -> CreateEmbed {
    CreateEmbed::new()
        .title(t!("settings_title"))
        .color(INFO_COLOR)
        .fields(fields.into_iter().map(|(name, value)| (name, value, false)))
}

/// Set this channel for daily event notifications (Admin only)
#[poise::command(
    slash_command,
    rename = "set-notification-channel",
    guild_only,
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn set_notification_channel(ctx: Context<'_>) -> CommandResult {
    let guild_id = require_guild(ctx)?;
    let is_admin = caller_is_admin(ctx).await;
    let channel_id = ctx.channel_id().get();
    let app = &ctx.data().app;

    apply_settings_change(
        &app.settings,
        is_admin,
        guild_id,
        SettingsChange::Set(SettingsField::NotificationChannel(Some(channel_id))),
    )
    .await?;

    let time = app.config.read().await.notification_time.format("%H:%M").to_string();
    info!("Guild {} now receives reminders in channel {}", guild_id, channel_id);
    ctx.send(admin_reply(create_success_embed(
        &t!("settings_title"),
        &t!("channel_set", channel = channel_id, time = time),
    )))
    .await?;
    Ok(())
}

/// Set a custom iCal URL for this server (Admin only)
#[poise::command(
    slash_command,
    rename = "set-calendar-url",
    guild_only,
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn set_calendar_url(
    ctx: Context<'_>,
    #[description = "The iCal URL (.ics)"] url: String,
) -> CommandResult {
    let guild_id = require_guild(ctx)?;
    let is_admin = caller_is_admin(ctx).await;
    let app = &ctx.data().app;

    let url = match validate_url(url.trim()) {
        Ok(url) => url.to_string(),
        Err(e) => {
            ctx.send(admin_reply(create_error_embed(
                &t!("error_title", context = "set-calendar-url"),
                &t!("calendar_url_invalid", error = e.to_string()),
            )))
            .await?;
            return Ok(());
        }
    };

    apply_settings_change(
        &app.settings,
        is_admin,
        guild_id,
        SettingsChange::Set(SettingsField::CalendarUrl(Some(url.clone()))),
    )
    .await?;
    info!("Guild {} switched calendar to {}", guild_id, url);

    ctx.defer_ephemeral().await?;

    let embed = match app.calendar.refresh(&url).await {
        Ok(count) => create_success_embed(
            &t!("settings_title"),
            &t!("calendar_url_updated", count = count),
        ),
        Err(e) => create_warning_embed(
            &t!("settings_title"),
            &t!("calendar_url_updated_fetch_failed", error = e.to_string()),
        ),
    };
    ctx.send(admin_reply(embed)).await?;
    Ok(())
}

/// Toggle whether to ping @everyone for important events (Admin only)
#[poise::command(
    slash_command,
    rename = "toggle-ping-everyone",
    guild_only,
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn toggle_ping_everyone(ctx: Context<'_>) -> CommandResult {
    let guild_id = require_guild(ctx)?;
    let is_admin = caller_is_admin(ctx).await;

    let updated = apply_settings_change(
        &ctx.data().app.settings,
        is_admin,
        guild_id,
        SettingsChange::TogglePingEveryone,
    )
    .await?;

    let message = if updated.ping_everyone {
        t!("ping_everyone_enabled")
    } else {
        t!("ping_everyone_disabled")
    };
    ctx.send(admin_reply(create_success_embed(&t!("settings_title"), &message)))
        .await?;
    Ok(())
}

/// Show the current bot settings for this server (Admin only)
#[poise::command(
    slash_command,
    rename = "show-settings",
    guild_only,
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn show_settings(ctx: Context<'_>) -> CommandResult {
    let guild_id = admin_guild(ctx).await?;
    let app = &ctx.data().app;

    let settings = app.settings.get(guild_id).await;
    let default_url = app.default_calendar_url().await;
    let cached_events = match settings.feed_url(default_url.as_deref()) {
        Some(url) => app.calendar.snapshot(&url).await.map(|snapshot| snapshot.len()),
        None => None,
    };

    let fields = settings_fields(&settings, default_url.as_deref(), cached_events);
    ctx.send(admin_reply(settings_embed(fields))).await?;
    Ok(())
}

/// Manually refresh event data from the calendar (Admin only)
#[poise::command(
    slash_command,
    rename = "refresh-eventdata",
    guild_only,
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn refresh_eventdata(ctx: Context<'_>) -> CommandResult {
    let guild_id = admin_guild(ctx).await?;
    let app = &ctx.data().app;

    let url = app
        .feed_url_for(Some(guild_id))
        .await
        .ok_or_else(|| Error::NotConfigured("no calendar URL".to_string()))?;

    ctx.defer_ephemeral().await?;

    let embed = match app.calendar.refresh(&url).await {
        Ok(count) => create_success_embed(&t!("settings_title"), &t!("refresh_done", count = count)),
        Err(e) => create_warning_embed(
            &t!("settings_title"),
            &t!("refresh_failed", error = e.to_string()),
        ),
    };
    ctx.send(admin_reply(embed)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_urls_are_truncated() {
        let long = format!("https://calendar.example.com/{}", "a".repeat(80));
        let shown = truncate_url(&long);
        assert_eq!(shown.chars().count(), MAX_URL_DISPLAY + 3);
        assert!(shown.ends_with("..."));

        assert_eq!(truncate_url("https://a.b/c.ics"), "https://a.b/c.ics");
    }

    #[test]
    fn admin_replies_are_private() {
        let reply = admin_reply(create_success_embed("Settings", "done"));
        assert_eq!(reply.ephemeral, Some(true));
        assert_eq!(reply.embeds.len(), 1);
    }

    #[test]
    fn settings_fields_describe_the_record() {
        let mut settings = GuildSettings::new(7);
        settings.notification_channel_id = Some(42);
        settings.ping_everyone = false;

        let fields = settings_fields(&settings, Some("https://default/cal.ics"), Some(12));
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].1, "<#42>");
        assert!(fields[1].1.contains("https://default/cal.ics"));
        assert!(fields[1].1.contains("default"));
        assert!(fields[2].1.contains("Disabled"));
        assert_eq!(fields[3].1, "12");

        let unset = settings_fields(&GuildSettings::new(8), None, None);
        assert_eq!(unset[0].1, "Not set");
        assert_eq!(unset[1].1, "Not set");
        assert!(unset[2].1.contains("Enabled"));
        assert_eq!(unset[3].1, "0");
    }
}
