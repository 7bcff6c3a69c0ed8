use crate::commands::{create_success_embed, CommandResult, Context};
use poise::serenity_prelude::CreateAllowedMentions;
use rust_i18n::t;

/// Check whether the bot is responsive
#[poise::command(slash_command)]
pub async fn ping(ctx: Context<'_>) -> CommandResult {
    let latency = ctx.ping().await.as_millis();
    ctx.send(poise::CreateReply::default().embed(create_success_embed(
        &t!("ping_command"),
        &t!("ping_response", latency = latency),
    )))
    .await?;
    Ok(())
}

/// Make the bot say something
#[poise::command(slash_command)]
pub async fn say(
    ctx: Context<'_>,
    #[description = "What the bot should say"] message: String,
) -> CommandResult {
    // Echoed text never pings anyone
    ctx.send(
        poise::CreateReply::default()
            .content(message)
            .allowed_mentions(CreateAllowedMentions::new()),
    )
    .await?;
    Ok(())
}
