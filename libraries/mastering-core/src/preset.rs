//! Mastering presets
//!
//! A preset either carries three parametric EQ bands plus dynamics settings,
//! or a custom recipe: a fixed table of stages with placeholders for the
//! computed gain and the final limiter.

use crate::error::{PresetError, Result};
use crate::stage::{CompressorSettings, FilterStage, LimiterSettings};
use serde::{Deserialize, Serialize};

/// Lowest integrated loudness target the loudness normalizer accepts
pub const MIN_TARGET_LUFS: f64 = -70.0;

/// Lowest true-peak ceiling the loudness normalizer accepts
pub const MIN_TRUE_PEAK_CEILING_DB: f64 = -9.0;

/// Highest ratio the compressor accepts
pub const MAX_COMPRESSOR_RATIO: f64 = 20.0;

/// Shelf band (bass or high)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShelfBand {
    pub freq_hz: f64,
    pub gain_db: f64,
}

/// Bell band (mid)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BellBand {
    pub freq_hz: f64,
    pub gain_db: f64,
    pub q: f64,
}

/// Settings for a parametric preset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParametricChain {
    pub bass: ShelfBand,
    pub mid: BellBand,
    pub high: ShelfBand,
    pub compressor: CompressorSettings,
    pub limiter: LimiterSettings,
}

/// One entry of a custom recipe table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeStep {
    /// A fixed stage emitted as-is
    Stage(FilterStage),
    /// The computed leveling gain (omitted when sub-audible)
    Gain,
    /// Final limiter; the ceiling comes from the preset's true-peak ceiling
    Limiter { attack_ms: f64, release_ms: f64 },
}

/// Fixed processing recipe for a custom-chain preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRecipe {
    pub steps: Vec<RecipeStep>,
}

impl CustomRecipe {
    pub fn new(steps: &[RecipeStep]) -> Self {
        Self {
            steps: steps.to_vec(),
        }
    }
}

/// The processing description of a preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum PresetChain {
    Parametric(ParametricChain),
    Custom(CustomRecipe),
}

/// Preset family, used to pick the target tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetFamily {
    Parametric,
    Custom,
}

/// A named mastering preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Stable identifier used for lookups
    pub id: String,

    #[serde(default)]
    pub description: String,

    /// Target integrated loudness in LUFS
    pub target_lufs: f64,

    /// True-peak ceiling in dBTP
    pub true_peak_ceiling_db: f64,

    pub chain: PresetChain,
}

impl Preset {
    pub fn parametric(
        id: impl Into<String>,
        description: impl Into<String>,
        target_lufs: f64,
        true_peak_ceiling_db: f64,
        chain: ParametricChain,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            target_lufs,
            true_peak_ceiling_db,
            chain: PresetChain::Parametric(chain),
        }
    }

    pub fn custom(
        id: impl Into<String>,
        description: impl Into<String>,
        target_lufs: f64,
        true_peak_ceiling_db: f64,
        steps: &[RecipeStep],
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            target_lufs,
            true_peak_ceiling_db,
            chain: PresetChain::Custom(CustomRecipe::new(steps)),
        }
    }

    pub fn is_custom_chain(&self) -> bool {
        matches!(self.chain, PresetChain::Custom(_))
    }

    pub fn family(&self) -> PresetFamily {
        match self.chain {
            PresetChain::Parametric(_) => PresetFamily::Parametric,
            PresetChain::Custom(_) => PresetFamily::Custom,
        }
    }

    /// Check that every field is in a range the renderer can accept
    pub fn validate(&self) -> Result<()> {
        let id = self.id.as_str();
        if id.trim().is_empty() {
            return Err(PresetError::invalid(id, "id must not be empty"));
        }
        if !(is_negative(self.target_lufs) && self.target_lufs >= MIN_TARGET_LUFS) {
            return Err(PresetError::invalid(
                id,
                format!(
                    "target loudness must be in [{}, 0), got {}",
                    MIN_TARGET_LUFS, self.target_lufs
                ),
            ));
        }
        if !(is_negative(self.true_peak_ceiling_db)
            && self.true_peak_ceiling_db >= MIN_TRUE_PEAK_CEILING_DB)
        {
            return Err(PresetError::invalid(
                id,
                format!(
                    "true-peak ceiling must be in [{}, 0), got {}",
                    MIN_TRUE_PEAK_CEILING_DB, self.true_peak_ceiling_db
                ),
            ));
        }

        match &self.chain {
            PresetChain::Parametric(p) => {
                for band in [p.bass, p.high] {
                    check_freq(id, band.freq_hz)?;
                    check_finite(id, "band gain", band.gain_db)?;
                }
                check_freq(id, p.mid.freq_hz)?;
                check_finite(id, "band gain", p.mid.gain_db)?;
                check_positive(id, "Q", p.mid.q)?;
                check_compressor(id, &p.compressor)?;
                check_limiter(id, &p.limiter)?;
            }
            PresetChain::Custom(recipe) => check_recipe(id, recipe)?,
        }

        Ok(())
    }
}

fn is_negative(value: f64) -> bool {
    value.is_finite() && value < 0.0
}

fn check_finite(id: &str, what: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PresetError::invalid(id, format!("{} must be finite", what)))
    }
}

fn check_positive(id: &str, what: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PresetError::invalid(
            id,
            format!("{} must be positive, got {}", what, value),
        ))
    }
}

fn check_freq(id: &str, freq_hz: f64) -> Result<()> {
    check_positive(id, "frequency", freq_hz)
}

fn check_compressor(id: &str, c: &CompressorSettings) -> Result<()> {
    check_finite(id, "compressor threshold", c.threshold_db)?;
    if !(1.0..=MAX_COMPRESSOR_RATIO).contains(&c.ratio) {
        return Err(PresetError::invalid(
            id,
            format!(
                "compressor ratio must be in [1, {}], got {}",
                MAX_COMPRESSOR_RATIO, c.ratio
            ),
        ));
    }
    check_positive(id, "compressor attack", c.attack_ms)?;
    check_positive(id, "compressor release", c.release_ms)
}

fn check_limiter(id: &str, l: &LimiterSettings) -> Result<()> {
    if !is_negative(l.ceiling_db) {
        return Err(PresetError::invalid(
            id,
            format!("limiter ceiling must be negative, got {}", l.ceiling_db),
        ));
    }
    check_positive(id, "limiter attack", l.attack_ms)?;
    check_positive(id, "limiter release", l.release_ms)
}

/// A recipe is framed by exactly one high-pass stage at the head and exactly
/// one limiter step at the tail, with at most one gain slot in between.
fn check_recipe(id: &str, recipe: &CustomRecipe) -> Result<()> {
    let Some((last, rest)) = recipe.steps.split_last() else {
        return Err(PresetError::invalid(id, "custom recipe must not be empty"));
    };
    let RecipeStep::Limiter {
        attack_ms,
        release_ms,
    } = last
    else {
        return Err(PresetError::invalid(
            id,
            "custom recipe must end in a limiter step",
        ));
    };
    check_positive(id, "limiter attack", *attack_ms)?;
    check_positive(id, "limiter release", *release_ms)?;

    let Some((RecipeStep::Stage(FilterStage::HighPass { freq_hz }), middle)) = rest.split_first()
    else {
        return Err(PresetError::invalid(
            id,
            "custom recipe must start with a high-pass stage",
        ));
    };
    check_freq(id, *freq_hz)?;

    let mut gain_slots = 0;
    for step in middle {
        match step {
            RecipeStep::Stage(FilterStage::HighPass { .. }) => {
                return Err(PresetError::invalid(
                    id,
                    "custom recipe must have exactly one high-pass stage, at the start",
                ));
            }
            RecipeStep::Stage(FilterStage::Limiter(_)) | RecipeStep::Limiter { .. } => {
                return Err(PresetError::invalid(
                    id,
                    "custom recipe must have exactly one limiter, at the end",
                ));
            }
            RecipeStep::Stage(stage) => check_stage(id, stage)?,
            RecipeStep::Gain => {
                gain_slots += 1;
                if gain_slots > 1 {
                    return Err(PresetError::invalid(
                        id,
                        "custom recipe must have at most one gain slot",
                    ));
                }
            }
        }
    }
    Ok(())
}

fn check_stage(id: &str, stage: &FilterStage) -> Result<()> {
    match stage {
        FilterStage::HighPass { freq_hz } => check_freq(id, *freq_hz),
        FilterStage::Shelf {
            freq_hz, gain_db, ..
        } => {
            check_freq(id, *freq_hz)?;
            check_finite(id, "shelf gain", *gain_db)
        }
        FilterStage::Bell {
            freq_hz,
            gain_db,
            q,
        } => {
            check_freq(id, *freq_hz)?;
            check_finite(id, "bell gain", *gain_db)?;
            check_positive(id, "Q", *q)
        }
        FilterStage::Compressor(c) => check_compressor(id, c),
        FilterStage::Limiter(l) => check_limiter(id, l),
        FilterStage::Gain { db } => check_finite(id, "gain", *db),
        FilterStage::LoudnessNormalize(_) => Err(PresetError::invalid(
            id,
            "loudness normalization is reserved for the corrective pass",
        )),
    }
}
