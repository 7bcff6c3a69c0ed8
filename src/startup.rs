use crate::commands::{create_error_embed, error_reply_text, get_all_application_commands, CommandContext};
use crate::components::school_calendar::{CalendarRefresher, DailyNotifier};
use crate::components::storage::open_backend;
use crate::components::{AppContext, CalendarHandle, ComponentManager, SettingsHandle};
use crate::config::Config;
use crate::error::Error;
use crate::shutdown;
use poise::serenity_prelude as serenity;
use rust_i18n::t;
use serenity::model::user::OnlineStatus;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,serenity=warn,poise=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => {
            info!("Loaded configuration: {:?}", config);
            Ok(Arc::new(RwLock::new(config)))
        }
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Open storage and spawn the settings and calendar actors
pub async fn build_app(config: Arc<RwLock<Config>>) -> miette::Result<AppContext> {
    let backend = {
        let config_read = config.read().await;
        open_backend(&config_read).await?
    };

    let settings = SettingsHandle::new(Arc::clone(&backend));
    let calendar = CalendarHandle::new(backend);

    Ok(AppContext::new(config, settings, calendar))
}

/// Initialize and start the Discord bot
pub async fn start_bot(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let (token, activity) = {
        let config_read = config.read().await;
        (config_read.discord_token.clone(), config_read.activity.clone())
    };

    // Set locale from config
    {
        let config_read = config.read().await;
        crate::utils::i18n::set_locale(&config_read.bot_locale);
        info!("Setting locale to {}", config_read.bot_locale);
    }

    let app = build_app(Arc::clone(&config)).await?;

    // Set up framework options
    let options = poise::FrameworkOptions {
        commands: get_all_application_commands(),
        on_error: |error| Box::pin(on_error(error)),
        ..Default::default()
    };

    // Slash commands only, so no privileged intents are needed
    let intents = serenity::GatewayIntents::non_privileged();

    let mut component_manager = ComponentManager::new(Arc::clone(&config));
    component_manager.register(CalendarRefresher::new()).await;
    component_manager.register(DailyNotifier::new()).await;
    let component_manager = Arc::new(component_manager);

    let command_data = CommandContext::new(app.clone());

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();

    let shutdown_components = Arc::clone(&component_manager);
    let shutdown_app = app.clone();
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, shutdown_components, shutdown_app).await;
    });

    let client_result = serenity::ClientBuilder::new(token, intents)
        .framework(poise::Framework::new(options, move |ctx, ready, framework| {
            Box::pin(async move {
                info!("{} is connected!", ready.user.name);

                ctx.set_presence(
                    Some(serenity::ActivityData::playing(&activity)),
                    OnlineStatus::Online,
                );
                info!("Setting activity to {}", activity);

                // Register slash commands
                if let Err(e) =
                    poise::builtins::register_globally(ctx, &framework.options().commands).await
                {
                    error!("Failed to register slash commands: {:?}", e);
                } else {
                    info!("Slash commands registered successfully");
                }

                // Start the timers
                if let Err(e) = component_manager
                    .init_all(Arc::clone(&ctx.http), app)
                    .await
                {
                    error!("Failed to initialize components: {:?}", e);
                }

                Ok(command_data)
            })
        }))
        .await;

    info!("Starting bot...");
    let mut client = client_result.map_err(Error::from)?;

    // Create a separate task to handle the client
    let client_handle = tokio::spawn(async move {
        if let Err(e) = client.start().await {
            Err(Error::from(e))
        } else {
            Ok(())
        }
    });

    // Wait for either the client to end or a shutdown signal
    tokio::select! {
        result = client_handle => {
            info!("Bot process ended");
            match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.into()),
                Err(e) => {
                    error!("Client task error: {:?}", e);
                    Err(Error::Other(format!("Client task error: {}", e)).into())
                }
            }
        }
        _ = shutdown_recv => {
            info!("Received shutdown signal, shutting down bot...");
            Ok(())
        }
    }
}

/// Reply ephemerally with an error embed
async fn reply_error(ctx: crate::commands::Context<'_>, title: &str, description: &str) {
    if let Err(e) = ctx
        .send(
            poise::CreateReply::default()
                .embed(create_error_embed(title, description))
                .ephemeral(true),
        )
        .await
    {
        error!("Error while sending error message: {:?}", e);
    }
}

/// Handle errors from commands
async fn on_error(error: poise::FrameworkError<'_, CommandContext, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Error during setup: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.is_user_facing() {
                info!("Command '{}' refused: {}", ctx.command().name, error);
            } else {
                error!("Error in command '{}': {:?}", ctx.command().name, error);
            }

            let title = match &error {
                Error::NotConfigured(_) => t!("not_configured_title"),
                _ => t!("error_title", context = ctx.command().name.as_str()),
            };
            reply_error(ctx, &title, &error_reply_text(&error)).await;
        }
        poise::FrameworkError::GuildOnly { ctx, .. } => {
            reply_error(ctx, &t!("error_title", context = "guild"), &t!("guild_only")).await;
        }
        poise::FrameworkError::CommandCheckFailed { error, ctx, .. } => {
            if let Some(error) = error {
                error!("Command check failed: {:?}", error);
                reply_error(
                    ctx,
                    &t!("error_title", context = "check"),
                    &error.to_string(),
                )
                .await;
            }
        }
        error => {
            error!("Other error: {:?}", error);
        }
    }
}
