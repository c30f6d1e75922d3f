pub mod config;
pub mod settings;
pub mod types;

pub use config::FamfinConfig;
pub use settings::{EnvSource, ProcessEnv, ResolvedEnv, SettingKey, Settings, SettingsError, SettingsResolver};
pub use types::*;
