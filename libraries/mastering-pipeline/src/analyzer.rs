//! Loudness analysis through the rendering engine
//!
//! The engine prints windowed readings while it runs and a summary at the
//! end:
//!
//! ```text
//! [Parsed_ebur128_0 @ 0x5581] t: 2.9  TARGET:-23 LUFS  M: -15.8 S: -16.1  I: -16.3 LUFS  LRA: 1.2 LU
//! [Parsed_ebur128_0 @ 0x5581] Summary:
//!
//!   Integrated loudness:
//!     I:         -16.0 LUFS
//!     Threshold: -26.2 LUFS
//!
//!   True peak:
//!     Peak:       -0.3 dBFS
//! ```
//!
//! Every `I: <value> LUFS` reading is collected and the last one wins, so the
//! summary supersedes the windowed readings. Missing readings fall back to the
//! unmeasured sentinels instead of failing the job.

use crate::error::RenderError;
use crate::renderer::Renderer;
use mastering_core::{AnalysisResult, UNMEASURED_LUFS, UNMEASURED_PEAK_DB};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Recoverable problems found while parsing diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisParseWarning {
    /// No integrated loudness reading; sentinel loudness used
    MissingLoudness,
    /// No peak reading; sentinel peak used
    MissingPeak,
}

impl fmt::Display for AnalysisParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLoudness => write!(
                f,
                "no integrated loudness reading, assuming {} LUFS",
                UNMEASURED_LUFS
            ),
            Self::MissingPeak => write!(
                f,
                "no peak reading, assuming {} dBFS",
                UNMEASURED_PEAK_DB
            ),
        }
    }
}

/// Parsed reading plus any fallbacks that were applied
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAnalysis {
    pub result: AnalysisResult,
    pub warnings: Vec<AnalysisParseWarning>,
}

/// Parse measurement diagnostics into an `AnalysisResult`
pub fn parse_diagnostics(text: &str) -> ParsedAnalysis {
    let mut loudness = None;
    let mut peak = None;

    for line in text.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        for window in tokens.windows(3) {
            match window {
                ["I:", value, "LUFS"] => {
                    if let Some(v) = finite(value) {
                        loudness = Some(v);
                    }
                }
                ["Peak:", value, "dBFS"] => {
                    if let Some(v) = finite(value) {
                        peak = Some(v);
                    }
                }
                _ => {}
            }
        }
    }

    let mut warnings = Vec::new();
    if loudness.is_none() {
        warnings.push(AnalysisParseWarning::MissingLoudness);
    }
    if peak.is_none() {
        warnings.push(AnalysisParseWarning::MissingPeak);
    }

    ParsedAnalysis {
        result: AnalysisResult::new(
            loudness.unwrap_or(UNMEASURED_LUFS),
            peak.unwrap_or(UNMEASURED_PEAK_DB),
        ),
        warnings,
    }
}

fn finite(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Measures files through a [`Renderer`]
#[derive(Clone)]
pub struct LoudnessAnalyzer {
    renderer: Arc<dyn Renderer>,
}

impl LoudnessAnalyzer {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self { renderer }
    }

    /// Measure `path`
    ///
    /// Renderer failures are returned as errors; unparseable output is not.
    pub async fn analyze(&self, path: &Path) -> Result<AnalysisResult, RenderError> {
        let diagnostics = self.renderer.measure(path).await?;
        let parsed = parse_diagnostics(&diagnostics);

        for warning in &parsed.warnings {
            tracing::warn!("Analysis of {}: {}", path.display(), warning);
        }
        tracing::debug!("Analysis of {}: {}", path.display(), parsed.result);

        Ok(parsed.result)
    }
}
