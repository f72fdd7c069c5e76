//! Loudness readings
//!
//! An `AnalysisResult` is produced fresh for every measured file. When the
//! renderer's diagnostics don't contain a reading, the analyzer substitutes
//! the `UNMEASURED` sentinel values rather than zeros.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Loudness reported when no integrated loudness could be parsed (EBU R128 reference)
pub const UNMEASURED_LUFS: f64 = -23.0;

/// Peak reported when no peak could be parsed
pub const UNMEASURED_PEAK_DB: f64 = 0.0;

/// Measured loudness characteristics of one file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Integrated loudness in LUFS over the whole file
    pub integrated_lufs: f64,

    /// Peak level in dBFS (true peak when the renderer reports it)
    pub peak_db: f64,
}

impl AnalysisResult {
    pub const UNMEASURED: Self = Self {
        integrated_lufs: UNMEASURED_LUFS,
        peak_db: UNMEASURED_PEAK_DB,
    };

    pub fn new(integrated_lufs: f64, peak_db: f64) -> Self {
        Self {
            integrated_lufs,
            peak_db,
        }
    }

    /// Distance in LU between the measured loudness and `target_lufs`
    pub fn deviation_from(&self, target_lufs: f64) -> f64 {
        (self.integrated_lufs - target_lufs).abs()
    }
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self::UNMEASURED
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loudness: {:.1} LUFS, Peak: {:.1} dBFS",
            self.integrated_lufs, self.peak_db
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_sentinel() {
        let result = AnalysisResult::default();
        assert_eq!(result.integrated_lufs, -23.0);
        assert_eq!(result.peak_db, 0.0);
    }

    #[test]
    fn test_deviation_is_symmetric() {
        let loud = AnalysisResult::new(-7.0, -0.3);
        let quiet = AnalysisResult::new(-11.0, -2.0);
        assert!((loud.deviation_from(-9.0) - 2.0).abs() < 1e-9);
        assert!((quiet.deviation_from(-9.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_display() {
        let result = AnalysisResult::new(-14.04, -1.26);
        assert_eq!(result.to_string(), "Loudness: -14.0 LUFS, Peak: -1.3 dBFS");
    }
}
