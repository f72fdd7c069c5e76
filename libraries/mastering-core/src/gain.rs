//! Leveling gain
//!
//! Gain = target − measured, hard-clamped. Quiet sources can't be boosted
//! more than `max_db` and loud sources can't be cut more than `min_db`.

use crate::stage::FilterStage;
use serde::{Deserialize, Serialize};

/// Lower clamp bound in dB
pub const MIN_GAIN_DB: f64 = -6.0;

/// Upper clamp bound in dB
pub const MAX_GAIN_DB: f64 = 12.0;

/// Gains at or below this magnitude are not rendered
pub const GAIN_EPSILON_DB: f64 = 0.5;

/// Clamp bounds and omission threshold for the leveling gain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainLimits {
    pub min_db: f64,
    pub max_db: f64,
    pub epsilon_db: f64,
}

impl GainLimits {
    pub fn new(min_db: f64, max_db: f64, epsilon_db: f64) -> Self {
        Self {
            min_db,
            max_db,
            epsilon_db,
        }
    }

    /// Gain needed to move `measured_lufs` to `target_lufs`, clamped
    ///
    /// Never panics: inverted bounds are swapped and a NaN bound is ignored.
    pub fn compute(&self, measured_lufs: f64, target_lufs: f64) -> f64 {
        let gain = target_lufs - measured_lufs;
        if gain.is_nan() {
            return 0.0;
        }
        let (low, high) = if self.max_db < self.min_db {
            (self.max_db, self.min_db)
        } else {
            (self.min_db, self.max_db)
        };
        // f64::max/min return the other operand when one side is NaN
        gain.max(low).min(high)
    }

    /// A `Gain` stage for `gain_db`, or `None` when it is sub-audible
    pub fn stage(&self, gain_db: f64) -> Option<FilterStage> {
        (gain_db.abs() > self.epsilon_db).then_some(FilterStage::Gain { db: gain_db })
    }
}

impl Default for GainLimits {
    fn default() -> Self {
        Self::new(MIN_GAIN_DB, MAX_GAIN_DB, GAIN_EPSILON_DB)
    }
}

/// Gain with the default bounds
pub fn compute_gain(measured_lufs: f64, target_lufs: f64) -> f64 {
    GainLimits::default().compute(measured_lufs, target_lufs)
}
