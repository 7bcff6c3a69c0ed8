use crate::commands::{create_info_embed, CommandResult, Context};
use crate::config::CountdownDates;
use crate::utils::time::{countdown, format_date, Countdown};
use chrono::NaiveDate;
use rust_i18n::t;

/// School-year dates the countdown commands count toward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    Midyears,
    WinterBreak,
    EndOfSchool,
}

impl Milestone {
    pub fn title(&self) -> String {
        match self {
            Milestone::Midyears => t!("countdown_midyears_title"),
            Milestone::WinterBreak => t!("countdown_winter_break_title"),
            Milestone::EndOfSchool => t!("countdown_end_of_school_title"),
        }
        .to_string()
    }

    pub fn name(&self) -> String {
        match self {
            Milestone::Midyears => t!("countdown_midyears_name"),
            Milestone::WinterBreak => t!("countdown_winter_break_name"),
            Milestone::EndOfSchool => t!("countdown_end_of_school_name"),
        }
        .to_string()
    }

    pub fn target(&self, dates: &CountdownDates) -> NaiveDate {
        match self {
            Milestone::Midyears => dates.midyears,
            Milestone::WinterBreak => dates.winter_break,
            Milestone::EndOfSchool => dates.end_of_school,
        }
    }
}

/// Countdown sentence for `milestone` as seen on `today`
pub fn countdown_text(milestone: Milestone, today: NaiveDate, target: NaiveDate) -> String {
    let name = milestone.name();
    match countdown(today, target) {
        Countdown::Days(1) => t!("countdown_one_day", name = name).to_string(),
        Countdown::Days(days) => t!("countdown_days", days = days, name = name).to_string(),
        Countdown::Today => t!("countdown_today", name = name).to_string(),
        Countdown::Passed => t!("countdown_passed", name = name).to_string(),
    }
}

async fn reply_countdown(ctx: Context<'_>, milestone: Milestone) -> CommandResult {
    let app = &ctx.data().app;
    let target = milestone.target(&app.config.read().await.countdowns);
    let today = app.today().await;

    let embed = create_info_embed(&milestone.title(), &countdown_text(milestone, today, target))
        .field(t!("countdown_date_field"), format_date(target), false);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show how many days are left until midyears
#[poise::command(slash_command, rename = "days-until-midyears")]
pub async fn days_until_midyears(ctx: Context<'_>) -> CommandResult {
    reply_countdown(ctx, Milestone::Midyears).await
}

/// Show how many days are left until winter break
#[poise::command(slash_command, rename = "days-until-winter-break")]
pub async fn days_until_winter_break(ctx: Context<'_>) -> CommandResult {
    reply_countdown(ctx, Milestone::WinterBreak).await
}

/// Show how many days are left until the end of school
#[poise::command(slash_command, rename = "days-until-end-of-school")]
pub async fn days_until_end_of_school(ctx: Context<'_>) -> CommandResult {
    reply_countdown(ctx, Milestone::EndOfSchool).await
}
