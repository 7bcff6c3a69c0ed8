use crate::commands::{CommandResult, Context};
use crate::components::school_calendar::{CalendarSnapshot, EventCategory};
use crate::error::Error;
use crate::utils::time::format_date;
use chrono::NaiveDate;
use poise::serenity_prelude::CreateEmbed;
use rust_i18n::t;

/// How many events an `/upcoming-*` listing shows
pub const UPCOMING_LIMIT: usize = 5;

/// One line per upcoming event of `category`, soonest first
pub fn upcoming_lines(snapshot: &CalendarSnapshot, category: EventCategory, today: NaiveDate) -> Vec<String> {
    snapshot
        .query_upcoming(category, today, UPCOMING_LIMIT)
        .into_iter()
        .map(|event| format!("**{}**: {}", format_date(event.date), event.label))
        .collect()
}

pub fn upcoming_embed(snapshot: &CalendarSnapshot, category: EventCategory, today: NaiveDate) -> CreateEmbed {
    let lines = upcoming_lines(snapshot, category, today);
    let description = if lines.is_empty() {
        t!("upcoming_none").to_string()
    } else {
        lines.join("\n")
    };

    CreateEmbed::new()
        .title(t!(
            "upcoming_title",
            emoji = category.emoji(),
            category = category.plural_name()
        ))
        .description(description)
        .color(category.color())
}

/// Look up the caller's feed and reply with the next events of one category
async fn reply_upcoming(ctx: Context<'_>, category: EventCategory) -> CommandResult {
    let app = &ctx.data().app;
    let guild_id = ctx.guild_id().map(|id| id.get());

    let url = app
        .feed_url_for(guild_id)
        .await
        .ok_or_else(|| Error::NotConfigured("no calendar URL".to_string()))?;
    let snapshot = app
        .calendar
        .snapshot(&url)
        .await
        .ok_or_else(|| Error::NotConfigured(format!("no data fetched yet for {}", url)))?;

    let today = app.today().await;
    ctx.send(poise::CreateReply::default().embed(upcoming_embed(&snapshot, category, today)))
        .await?;
    Ok(())
}

/// Show the next upcoming halls
#[poise::command(slash_command, rename = "upcoming-halls")]
pub async fn upcoming_halls(ctx: Context<'_>) -> CommandResult {
    reply_upcoming(ctx, EventCategory::Hall).await
}

/// Show the next upcoming late starts
#[poise::command(slash_command, rename = "upcoming-late-starts")]
pub async fn upcoming_late_starts(ctx: Context<'_>) -> CommandResult {
    reply_upcoming(ctx, EventCategory::LateStart).await
}

/// Show the next upcoming dress days
#[poise::command(slash_command, rename = "upcoming-dress-days")]
pub async fn upcoming_dress_days(ctx: Context<'_>) -> CommandResult {
    reply_upcoming(ctx, EventCategory::DressDay).await
}

/// Show the next upcoming extended homerooms
#[poise::command(slash_command, rename = "upcoming-extended-homerooms")]
pub async fn upcoming_extended_homerooms(ctx: Context<'_>) -> CommandResult {
    reply_upcoming(ctx, EventCategory::ExtendedHomeroom).await
}
