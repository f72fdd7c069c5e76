//! Mastering pipeline
//!
//! Runs mastering jobs through an external rendering engine:
//! - Loudness analysis of the input and of every rendered master
//! - Primary lossless render through the preset's filter chain
//! - A corrective loudness pass when the master misses its target
//! - Distribution encode of the verified master
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────┐      ┌──────────────────┐      ┌────────┐
//! │ MasteringOrchestrator │ ───► │ dyn Renderer     │ ───► │ FFmpeg │
//! └───────────────────────┘      │ (FfmpegRenderer) │      └────────┘
//!        │          │            └──────────────────┘
//!        ▼          ▼
//!  PresetCatalog  LoudnessAnalyzer
//! ```
//!
//! The renderer sits behind a trait so tests can script its output.

#![forbid(unsafe_code)]

mod analyzer;
mod error;
mod ffmpeg;
mod job;
mod orchestrator;
mod renderer;
mod settings;
mod stats;

pub use analyzer::{parse_diagnostics, AnalysisParseWarning, LoudnessAnalyzer, ParsedAnalysis};
pub use error::{MasteringError, RenderError, Result, SettingsError};
pub use ffmpeg::{
    filter_graph, measure_args, render_args, stage_filter, transcode_args, FfmpegRenderer,
};
pub use job::{JobStatus, MasteringRequest, MasteringResult};
pub use orchestrator::MasteringOrchestrator;
pub use renderer::{DistributionFormat, LosslessFormat, Renderer};
pub use settings::MasteringSettings;
pub use stats::{CountingStats, NoopStats, StatsRecorder};

pub use tokio_util::sync::CancellationToken;
