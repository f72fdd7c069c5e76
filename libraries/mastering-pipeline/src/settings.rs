//! Pipeline settings
//!
//! The tolerances and gain bounds are empirical; they are settings rather
//! than constants so deployments can tune them.
use crate::error::SettingsError;
use crate::renderer::{DistributionFormat, LosslessFormat};
use mastering_core::{
    ChainBuilder, GainLimits, Preset, PresetFamily, COMPRESSOR_GATE_LUFS, GAIN_EPSILON_DB,
    MAX_GAIN_DB, MIN_GAIN_DB,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MasteringSettings {
    /// Allowed |output − target| for parametric presets before a corrective pass
    #[serde(default = "default_parametric_tolerance")]
    pub parametric_tolerance_lu: f64,

    /// Allowed |output − target| for custom-chain presets
    #[serde(default = "default_custom_tolerance")]
    pub custom_tolerance_lu: f64,

    #[serde(default = "default_gain_min")]
    pub gain_min_db: f64,

    #[serde(default = "default_gain_max")]
    pub gain_max_db: f64,

    #[serde(default = "default_gain_epsilon")]
    pub gain_epsilon_db: f64,

    /// Parametric presets only compress inputs louder than this
    #[serde(default = "default_compressor_gate")]
    pub compressor_gate_lufs: f64,

    /// Loudness range bound for the corrective normalization pass
    #[serde(default = "default_loudness_range_max")]
    pub loudness_range_max: f64,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_bit_depth")]
    pub bit_depth: u16,

    #[serde(default = "default_distribution_bitrate")]
    pub distribution_bitrate_kbps: u32,

    /// Upper bound for any single renderer call
    #[serde(default = "default_render_timeout")]
    pub render_timeout_secs: u64,
}

impl MasteringSettings {
    pub fn gain_limits(&self) -> GainLimits {
        GainLimits::new(self.gain_min_db, self.gain_max_db, self.gain_epsilon_db)
    }

    pub fn chain_builder(&self) -> ChainBuilder {
        ChainBuilder::new(self.gain_limits(), self.compressor_gate_lufs)
    }

    /// Target tolerance for `preset`'s family
    pub fn tolerance_for(&self, preset: &Preset) -> f64 {
        match preset.family() {
            PresetFamily::Parametric => self.parametric_tolerance_lu,
            PresetFamily::Custom => self.custom_tolerance_lu,
        }
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn lossless_format(&self) -> LosslessFormat {
        LosslessFormat {
            sample_rate: self.sample_rate,
            bit_depth: self.bit_depth,
        }
    }

    pub fn distribution_format(&self) -> DistributionFormat {
        DistributionFormat {
            bitrate_kbps: self.distribution_bitrate_kbps,
        }
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (name, value) in [
            ("parametric_tolerance_lu", self.parametric_tolerance_lu),
            ("custom_tolerance_lu", self.custom_tolerance_lu),
            ("loudness_range_max", self.loudness_range_max),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SettingsError(format!("{} must be positive, got {}", name, value)));
            }
        }

        if !(self.gain_min_db <= 0.0 && self.gain_max_db >= 0.0) {
            return Err(SettingsError(format!(
                "gain bounds must straddle 0 dB, got [{}, {}]",
                self.gain_min_db, self.gain_max_db
            )));
        }

        if !(self.gain_epsilon_db.is_finite() && self.gain_epsilon_db >= 0.0) {
            return Err(SettingsError(format!(
                "gain_epsilon_db must be >= 0, got {}",
                self.gain_epsilon_db
            )));
        }

        if !matches!(self.bit_depth, 16 | 24 | 32) {
            return Err(SettingsError(format!(
                "bit_depth must be 16, 24 or 32, got {}",
                self.bit_depth
            )));
        }

        if self.sample_rate == 0 || self.distribution_bitrate_kbps == 0 {
            return Err(SettingsError(
                "sample_rate and distribution_bitrate_kbps must be non-zero".to_string(),
            ));
        }

        if self.render_timeout_secs == 0 {
            return Err(SettingsError("render_timeout_secs must be non-zero".to_string()));
        }

        Ok(())
    }
}

// Default values
fn default_parametric_tolerance() -> f64 {
    2.0
}

fn default_custom_tolerance() -> f64 {
    1.5
}

fn default_gain_min() -> f64 {
    MIN_GAIN_DB
}

fn default_gain_max() -> f64 {
    MAX_GAIN_DB
}

fn default_gain_epsilon() -> f64 {
    GAIN_EPSILON_DB
}

fn default_compressor_gate() -> f64 {
    COMPRESSOR_GATE_LUFS
}

fn default_loudness_range_max() -> f64 {
    20.0
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_bit_depth() -> u16 {
    24
}

fn default_distribution_bitrate() -> u32 {
    320
}

fn default_render_timeout() -> u64 {
    600
}

impl Default for MasteringSettings {
    fn default() -> Self {
        Self {
            parametric_tolerance_lu: default_parametric_tolerance(),
            custom_tolerance_lu: default_custom_tolerance(),
            gain_min_db: default_gain_min(),
            gain_max_db: default_gain_max(),
            gain_epsilon_db: default_gain_epsilon(),
            compressor_gate_lufs: default_compressor_gate(),
            loudness_range_max: default_loudness_range_max(),
            sample_rate: default_sample_rate(),
            bit_depth: default_bit_depth(),
            distribution_bitrate_kbps: default_distribution_bitrate(),
            render_timeout_secs: default_render_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mastering_core::PresetCatalog;

    #[test]
    fn test_defaults() {
        let settings = MasteringSettings::default();
        settings.validate().unwrap();
        assert_eq!(settings.lossless_format(), LosslessFormat::default());
        assert_eq!(settings.distribution_format(), DistributionFormat::default());
        assert_eq!(settings.render_timeout(), Duration::from_secs(600));
        assert_eq!(settings.gain_limits(), GainLimits::default());
    }

    #[test]
    fn test_tolerance_by_family() {
        let settings = MasteringSettings::default();
        let catalog = PresetCatalog::builtin();
        assert_eq!(settings.tolerance_for(catalog.lookup("loud")), 2.0);
        assert_eq!(settings.tolerance_for(catalog.lookup("studio")), 1.5);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let settings: MasteringSettings =
            serde_json::from_str(r#"{ "custom_tolerance_lu": 1.0, "render_timeout_secs": 30 }"#)
                .unwrap();
        assert_eq!(settings.custom_tolerance_lu, 1.0);
        assert_eq!(settings.parametric_tolerance_lu, 2.0);
        assert_eq!(settings.render_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = MasteringSettings::default();
        settings.gain_min_db = 3.0;
        assert!(settings.validate().is_err());

        let mut settings = MasteringSettings::default();
        settings.custom_tolerance_lu = 0.0;
        assert!(settings.validate().is_err());

        let mut settings = MasteringSettings::default();
        settings.bit_depth = 20;
        assert!(settings.validate().is_err());

        let mut settings = MasteringSettings::default();
        settings.render_timeout_secs = 0;
        assert!(settings.validate().is_err());
    }
}
