use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Discord API error: {0}")]
    #[diagnostic(code(foxbot::discord_api))]
    DiscordApi(#[from] serenity::Error),

    #[error("Environment error: {0}")]
    #[diagnostic(
        code(foxbot::environment),
        help("Set it in the process environment or in a .env file")
    )]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(foxbot::config))]
    Config(String),

    #[error("Calendar fetch error: {0}")]
    #[diagnostic(code(foxbot::fetch))]
    Fetch(String),

    #[error("Permission denied")]
    #[diagnostic(code(foxbot::permission_denied))]
    PermissionDenied,

    #[error("Not configured: {0}")]
    #[diagnostic(code(foxbot::not_configured))]
    NotConfigured(String),

    #[error("Failed to send message: {0}")]
    #[diagnostic(code(foxbot::send))]
    Send(String),

    #[error("Storage error: {0}")]
    #[diagnostic(code(foxbot::storage))]
    Storage(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(foxbot::component))]
    Component(String),

    #[error(transparent)]
    #[diagnostic(code(foxbot::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(foxbot::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(foxbot::other))]
    Other(String),
}

impl Error {
    /// Errors that are answered to the user as a normal reply instead of being logged as failures
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Error::PermissionDenied | Error::NotConfigured(_))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Fetch(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type BotResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create calendar fetch errors
pub fn fetch_error(message: &str) -> Error {
    Error::Fetch(message.to_string())
}

/// Helper to create storage errors
pub fn storage_error(message: &str) -> Error {
    Error::Storage(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}

/// Helper to create send errors
pub fn send_error(message: &str) -> Error {
    Error::Send(message.to_string())
}
