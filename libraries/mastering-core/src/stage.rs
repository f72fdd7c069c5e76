//! Filter stages
//!
//! A rendering pass is an ordered `Vec<FilterStage>`. The order is the series
//! signal chain and must be handed to the renderer exactly as constructed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which end of the spectrum a shelf filter acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShelfKind {
    Low,
    High,
}

/// Compressor parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressorSettings {
    /// Threshold in dBFS
    pub threshold_db: f64,
    /// Compression ratio (N:1)
    pub ratio: f64,
    pub attack_ms: f64,
    pub release_ms: f64,
}

/// Brickwall limiter parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimiterSettings {
    /// Output ceiling in dBFS
    pub ceiling_db: f64,
    pub attack_ms: f64,
    pub release_ms: f64,
}

/// Single-pass loudness normalization, used for the corrective pass only
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizeSettings {
    pub target_lufs: f64,
    pub true_peak_db: f64,
    /// Upper bound on loudness range in LU
    pub loudness_range_max: f64,
    /// Apply a single linear gain instead of dynamic normalization
    pub linear: bool,
}

/// One stage of a rendering pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterStage {
    HighPass {
        freq_hz: f64,
    },
    Shelf {
        kind: ShelfKind,
        freq_hz: f64,
        gain_db: f64,
    },
    Bell {
        freq_hz: f64,
        gain_db: f64,
        q: f64,
    },
    Compressor(CompressorSettings),
    Limiter(LimiterSettings),
    Gain {
        db: f64,
    },
    LoudnessNormalize(NormalizeSettings),
}

impl FilterStage {
    /// Short stage name, used in logs and CLI output
    pub fn name(&self) -> &'static str {
        match self {
            Self::HighPass { .. } => "high-pass",
            Self::Shelf {
                kind: ShelfKind::Low,
                ..
            } => "low-shelf",
            Self::Shelf {
                kind: ShelfKind::High,
                ..
            } => "high-shelf",
            Self::Bell { .. } => "bell",
            Self::Compressor(_) => "compressor",
            Self::Limiter(_) => "limiter",
            Self::Gain { .. } => "gain",
            Self::LoudnessNormalize(_) => "loudness-normalize",
        }
    }

    pub fn is_limiter(&self) -> bool {
        matches!(self, Self::Limiter(_))
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighPass { freq_hz } => write!(f, "high-pass {:.0} Hz", freq_hz),
            Self::Shelf {
                freq_hz, gain_db, ..
            } => write!(f, "{} {:.0} Hz {:+.1} dB", self.name(), freq_hz, gain_db),
            Self::Bell {
                freq_hz,
                gain_db,
                q,
            } => write!(f, "bell {:.0} Hz {:+.1} dB Q{:.2}", freq_hz, gain_db, q),
            Self::Compressor(c) => write!(
                f,
                "compressor {:.1} dB {:.1}:1 {:.0}/{:.0} ms",
                c.threshold_db, c.ratio, c.attack_ms, c.release_ms
            ),
            Self::Limiter(l) => write!(
                f,
                "limiter {:.1} dB {:.0}/{:.0} ms",
                l.ceiling_db, l.attack_ms, l.release_ms
            ),
            Self::Gain { db } => write!(f, "gain {:+.2} dB", db),
            Self::LoudnessNormalize(n) => write!(
                f,
                "loudness-normalize {:.1} LUFS / {:.1} dBTP (LRA {:.0}, {})",
                n.target_lufs,
                n.true_peak_db,
                n.loudness_range_max,
                if n.linear { "linear" } else { "dynamic" }
            ),
        }
    }
}
