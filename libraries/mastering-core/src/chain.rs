//! Filter chain construction
//!
//! Turns a preset and the input's loudness reading into the ordered stage
//! list for the primary render. Building never fails and is deterministic.
//!
//! # Parametric presets
//!
//! ```text
//! [low shelf] → [bell] → [high shelf] → [compressor] → [gain] → limiter
//! ```
//!
//! Bands with 0 dB gain are skipped. The compressor is only inserted when the
//! input is louder than the compressor gate; quieter material goes straight to
//! leveling. The gain stage follows the omission rule in [`GainLimits`].
//!
//! # Custom presets
//!
//! The recipe table is walked in order. `Gain` steps become the computed gain
//! stage (or nothing), `Limiter` steps become a limiter at the preset's
//! true-peak ceiling.

use crate::analysis::AnalysisResult;
use crate::gain::GainLimits;
use crate::preset::{CustomRecipe, ParametricChain, Preset, PresetChain, RecipeStep};
use crate::stage::{FilterStage, LimiterSettings, ShelfKind};
use serde::{Deserialize, Serialize};

/// Input loudness above which parametric presets compress (LUFS)
pub const COMPRESSOR_GATE_LUFS: f64 = -20.0;

/// Output of [`ChainBuilder::build`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterChain {
    /// Ordered stages for one rendering pass
    pub stages: Vec<FilterStage>,

    /// Leveling gain computed for this input, whether or not a stage was emitted
    pub gain_db: f64,
}

impl FilterChain {
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainBuilder {
    gain: GainLimits,
    compressor_gate_lufs: f64,
}

impl ChainBuilder {
    pub fn new(gain: GainLimits, compressor_gate_lufs: f64) -> Self {
        Self {
            gain,
            compressor_gate_lufs,
        }
    }

    pub fn gain_limits(&self) -> GainLimits {
        self.gain
    }

    pub fn build(&self, preset: &Preset, input: &AnalysisResult) -> FilterChain {
        let gain_db = self.gain.compute(input.integrated_lufs, preset.target_lufs);

        let stages = match &preset.chain {
            PresetChain::Parametric(chain) => self.parametric(chain, input, gain_db),
            PresetChain::Custom(recipe) => {
                self.custom(recipe, preset.true_peak_ceiling_db, gain_db)
            }
        };

        tracing::debug!(
            "Built {} stage chain for preset '{}' (gain {:+.2} dB)",
            stages.len(),
            preset.id,
            gain_db
        );

        FilterChain { stages, gain_db }
    }

    fn parametric(
        &self,
        chain: &ParametricChain,
        input: &AnalysisResult,
        gain_db: f64,
    ) -> Vec<FilterStage> {
        let mut stages = Vec::with_capacity(6);

        if chain.bass.gain_db != 0.0 {
            stages.push(FilterStage::Shelf {
                kind: ShelfKind::Low,
                freq_hz: chain.bass.freq_hz,
                gain_db: chain.bass.gain_db,
            });
        }
        if chain.mid.gain_db != 0.0 {
            stages.push(FilterStage::Bell {
                freq_hz: chain.mid.freq_hz,
                gain_db: chain.mid.gain_db,
                q: chain.mid.q,
            });
        }
        if chain.high.gain_db != 0.0 {
            stages.push(FilterStage::Shelf {
                kind: ShelfKind::High,
                freq_hz: chain.high.freq_hz,
                gain_db: chain.high.gain_db,
            });
        }

        // Compressing near-silent material pumps the noise floor
        if input.integrated_lufs > self.compressor_gate_lufs {
            stages.push(FilterStage::Compressor(chain.compressor));
        }

        stages.extend(self.gain.stage(gain_db));
        stages.push(FilterStage::Limiter(chain.limiter));
        stages
    }

    fn custom(&self, recipe: &CustomRecipe, ceiling_db: f64, gain_db: f64) -> Vec<FilterStage> {
        recipe
            .steps
            .iter()
            .filter_map(|step| match *step {
                RecipeStep::Stage(stage) => Some(stage),
                RecipeStep::Gain => self.gain.stage(gain_db),
                RecipeStep::Limiter {
                    attack_ms,
                    release_ms,
                } => Some(FilterStage::Limiter(LimiterSettings {
                    ceiling_db,
                    attack_ms,
                    release_ms,
                })),
            })
            .collect()
    }
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new(GainLimits::default(), COMPRESSOR_GATE_LUFS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PresetCatalog;
    use crate::stage::CompressorSettings;

    #[test]
    fn test_loud_preset_scenario() {
        let catalog = PresetCatalog::builtin();
        let preset = catalog.lookup("loud");
        let chain = ChainBuilder::default().build(preset, &AnalysisResult::new(-16.0, -3.0));

        assert!((chain.gain_db - 7.0).abs() < 1e-9);

        let names: Vec<_> = chain.stages.iter().map(FilterStage::name).collect();
        assert_eq!(
            names,
            ["low-shelf", "high-shelf", "compressor", "gain", "limiter"]
        );
        assert_eq!(
            chain.stages.last(),
            Some(&FilterStage::Limiter(LimiterSettings {
                ceiling_db: -0.5,
                attack_ms: 3.0,
                release_ms: 40.0,
            }))
        );
        assert!(matches!(
            chain.stages[2],
            FilterStage::Compressor(CompressorSettings { ratio, .. }) if ratio == 2.0
        ));
    }

    #[test]
    fn test_compressor_gated_on_quiet_input() {
        let catalog = PresetCatalog::builtin();
        let builder = ChainBuilder::default();

        let quiet = builder.build(catalog.lookup("warm"), &AnalysisResult::new(-20.0, -6.0));
        assert!(!quiet
            .stages
            .iter()
            .any(|s| matches!(s, FilterStage::Compressor(_))));

        let louder = builder.build(catalog.lookup("warm"), &AnalysisResult::new(-19.9, -6.0));
        assert!(louder
            .stages
            .iter()
            .any(|s| matches!(s, FilterStage::Compressor(_))));
    }

    #[test]
    fn test_custom_limiter_uses_preset_ceiling() {
        let mut preset = PresetCatalog::builtin().lookup("studio").clone();
        preset.true_peak_ceiling_db = -2.0;
        let chain = ChainBuilder::default().build(&preset, &AnalysisResult::new(-14.0, -1.0));
        assert!(matches!(
            chain.stages.last(),
            Some(FilterStage::Limiter(LimiterSettings { ceiling_db, .. })) if *ceiling_db == -2.0
        ));
    }

    #[test]
    fn test_custom_chain_ignores_compressor_gate() {
        let catalog = PresetCatalog::builtin();
        let builder = ChainBuilder::default();
        let quiet = builder.build(catalog.lookup("studio"), &AnalysisResult::new(-30.0, -12.0));
        let loud = builder.build(catalog.lookup("studio"), &AnalysisResult::new(-8.0, -0.1));

        let count = |chain: &FilterChain| {
            chain
                .stages
                .iter()
                .filter(|s| matches!(s, FilterStage::Compressor(_)))
                .count()
        };
        assert_eq!(count(&quiet), 3);
        assert_eq!(count(&loud), 3);
    }

    #[test]
    fn test_custom_gain_omitted_when_on_target() {
        let catalog = PresetCatalog::builtin();
        let input = AnalysisResult::new(-10.2, -1.0);
        let chain = ChainBuilder::default().build(catalog.lookup("studio"), &input);
        assert!(!chain
            .stages
            .iter()
            .any(|s| matches!(s, FilterStage::Gain { .. })));
        assert!((chain.gain_db - 0.2).abs() < 1e-9);
    }
    #[test]
    fn test_inverted_gain_limits_build_without_panicking() {
        let builder = ChainBuilder::new(GainLimits::new(3.0, -3.0, 0.5), COMPRESSOR_GATE_LUFS);
        let chain = builder.build(
            PresetCatalog::builtin().lookup("studio"),
            &AnalysisResult::new(-30.0, -10.0),
        );
        assert_eq!(chain.gain_db, 3.0);
        assert!(chain.stages.contains(&FilterStage::Gain { db: 3.0 }));
    }
}
