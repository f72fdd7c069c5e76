/// CLI error types
use mastering_core::PresetError;
use mastering_pipeline::SettingsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Invalid preset configuration: {0}")]
    Preset(#[from] PresetError),
}
