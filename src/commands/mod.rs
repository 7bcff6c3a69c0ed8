use crate::components::AppContext;
use crate::error::{BotResult, Error};
use poise::serenity_prelude::CreateEmbed;
use rust_i18n::t;

// Export submodules
pub mod admin;
pub mod countdown;
pub mod events;
pub mod util;

const ERROR_COLOR: u32 = 0xE7_4C_3C;
const SUCCESS_COLOR: u32 = 0x2E_CC_71;
pub const INFO_COLOR: u32 = 0x34_98_DB;
const WARNING_COLOR: u32 = 0xF1_C4_0F;

/// Shared context for all commands
#[derive(Debug)]
pub struct CommandContext {
    pub app: AppContext,
}

impl CommandContext {
    /// Create a new command context
    pub fn new(app: AppContext) -> Self {
        Self { app }
    }
}

/// Type alias for command result
pub type CommandResult = BotResult<()>;

/// Type alias for poise context
pub type Context<'a> = poise::Context<'a, CommandContext, Error>;

pub fn create_error_embed(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title(title)
        .description(description)
        .color(ERROR_COLOR)
}

pub fn create_success_embed(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title(title)
        .description(description)
        .color(SUCCESS_COLOR)
}

pub fn create_info_embed(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title(title)
        .description(description)
        .color(INFO_COLOR)
}

pub fn create_warning_embed(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title(title)
        .description(description)
        .color(WARNING_COLOR)
}

/// Text of the error reply shown to the invoking user
pub fn error_reply_text(error: &Error) -> String {
    match error {
        Error::PermissionDenied => t!("permission_denied").to_string(),
        Error::NotConfigured(_) => t!("not_configured").to_string(),
        other => other.to_string(),
    }
}

/// Whether the invoking member holds the Administrator permission
pub async fn caller_is_admin(ctx: Context<'_>) -> bool {
    match ctx.author_member().await {
        Some(member) => member
            .permissions
            .map(|permissions| permissions.administrator())
            .unwrap_or(false),
        None => false,
    }
}

/// Guild the command was invoked in
pub fn require_guild(ctx: Context<'_>) -> BotResult<u64> {
    ctx.guild_id()
        .map(|guild_id| guild_id.get())
        .ok_or_else(|| Error::Other(t!("guild_only").to_string()))
}

/// All application commands
pub fn get_all_application_commands() -> Vec<poise::Command<CommandContext, Error>> {
    vec![
        // Utility commands
        util::ping(),
        util::say(),
        // Event listings
        events::upcoming_halls(),
        events::upcoming_late_starts(),
        events::upcoming_dress_days(),
        events::upcoming_extended_homerooms(),
        // Countdowns
        countdown::days_until_midyears(),
        countdown::days_until_winter_break(),
        countdown::days_until_end_of_school(),
        // Admin
        admin::set_notification_channel(),
        admin::set_calendar_url(),
        admin::toggle_ping_everyone(),
        admin::show_settings(),
        admin::refresh_eventdata(),
    ]
}
