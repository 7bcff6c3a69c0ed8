mod actor;
mod handle;
pub mod models;

pub use handle::SettingsHandle;
pub use models::{GuildSettings, SettingsField};
