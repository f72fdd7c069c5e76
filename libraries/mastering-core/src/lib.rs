//! Mastering core
//!
//! Pure, I/O-free building blocks of the mastering pipeline:
//! - Preset definitions and the preset catalog
//! - Leveling gain calculation
//! - Filter chain construction (parametric and recipe-driven custom chains)
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐     ┌──────────────┐     ┌──────────────────┐
//! │ PresetCatalog │ ──► │ ChainBuilder │ ──► │ Vec<FilterStage> │
//! └───────────────┘     └──────────────┘     └──────────────────┘
//!                              ▲
//!                              │
//!                     ┌────────────────┐
//!                     │ AnalysisResult │
//!                     └────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use mastering_core::{AnalysisResult, ChainBuilder, PresetCatalog};
//!
//! let catalog = PresetCatalog::builtin();
//! let preset = catalog.lookup("loud");
//! let chain = ChainBuilder::default().build(preset, &AnalysisResult::new(-16.0, -3.0));
//!
//! assert!((chain.gain_db - 7.0).abs() < 1e-9);
//! assert!(chain.stages.last().unwrap().is_limiter());
//! ```

#![forbid(unsafe_code)]

mod analysis;
mod builtin;
mod catalog;
mod chain;
mod error;
mod gain;
mod preset;
mod stage;

pub use analysis::{AnalysisResult, UNMEASURED_LUFS, UNMEASURED_PEAK_DB};
pub use builtin::{DEFAULT_PRESET_ID, STUDIO_RECIPE, STUDIO_VOCAL_RECIPE};
pub use catalog::PresetCatalog;
pub use chain::{ChainBuilder, FilterChain, COMPRESSOR_GATE_LUFS};
pub use error::{PresetError, Result};
pub use gain::{compute_gain, GainLimits, GAIN_EPSILON_DB, MAX_GAIN_DB, MIN_GAIN_DB};
pub use preset::{
    BellBand, CustomRecipe, ParametricChain, Preset, PresetChain, PresetFamily, RecipeStep,
    ShelfBand, MAX_COMPRESSOR_RATIO, MIN_TARGET_LUFS, MIN_TRUE_PEAK_CEILING_DB,
};
pub use stage::{CompressorSettings, FilterStage, LimiterSettings, NormalizeSettings, ShelfKind};
