/// CLI configuration
///
/// Sources, later ones overriding earlier ones:
/// 1. `--config <FILE>`, or `mastering.toml` in the working directory if present
/// 2. Environment variables prefixed `MASTERING_`, nested with `__`
///    (e.g. `MASTERING_RENDERER__FFMPEG_PATH`, `MASTERING_MASTERING__RENDER_TIMEOUT_SECS`)
use crate::error::Result;
use mastering_core::{Preset, PresetCatalog};
use mastering_pipeline::{FfmpegRenderer, MasteringSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "mastering.toml";

const ENV_PREFIX: &str = "MASTERING";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MasteringConfig {
    #[serde(default)]
    pub renderer: RendererSettings,

    #[serde(default)]
    pub mastering: MasteringSettings,

    /// Extra presets, added to (or replacing) the built-in ones
    #[serde(default)]
    pub presets: Vec<Preset>,

    /// Overrides the catalog's default preset
    #[serde(default)]
    pub default_preset: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RendererSettings {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
}

impl MasteringConfig {
    /// Load configuration from file and environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text, without environment overrides
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.mastering.validate()?;
        for preset in &self.presets {
            preset.validate()?;
        }
        Ok(())
    }

    /// Built-in presets plus the configured ones
    pub fn catalog(&self) -> Result<PresetCatalog> {
        let mut catalog = PresetCatalog::builtin();
        for preset in &self.presets {
            catalog.insert(preset.clone())?;
        }
        if let Some(id) = &self.default_preset {
            catalog.set_default(id)?;
        }
        Ok(catalog)
    }

    pub fn renderer(&self) -> FfmpegRenderer {
        FfmpegRenderer::new(self.renderer.ffmpeg_path.clone())
    }
}

// Default values
fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
        }
    }
}
