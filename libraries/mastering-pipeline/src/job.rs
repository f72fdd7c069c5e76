//! Per-invocation job state

use mastering_core::{AnalysisResult, FilterStage, Preset};
use crate::renderer::{DistributionFormat, LosslessFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Pipeline state of a single job
///
/// ```text
/// Start → AnalyzeInput → BuildChain → RenderPrimary → AnalyzeOutput
///     ├─ target met ──────────────────────────────────┐
///     └─ missed → CorrectivePass → ReanalyzeFinal ────┴→ TranscodeDeliverable → Done
/// ```
///
/// Any fatal error moves the job to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Start,
    AnalyzeInput,
    BuildChain,
    RenderPrimary,
    AnalyzeOutput,
    CorrectivePass,
    ReanalyzeFinal,
    TranscodeDeliverable,
    Done,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::AnalyzeInput => "analyze_input",
            Self::BuildChain => "build_chain",
            Self::RenderPrimary => "render_primary",
            Self::AnalyzeOutput => "analyze_output",
            Self::CorrectivePass => "corrective_pass",
            Self::ReanalyzeFinal => "reanalyze_final",
            Self::TranscodeDeliverable => "transcode_deliverable",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input and output locations of one mastering job
///
/// Concurrent jobs must never share output paths; [`MasteringRequest::in_directory`]
/// generates unique names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasteringRequest {
    pub input: PathBuf,
    pub preset_id: String,
    /// Lossless primary artifact (WAV)
    pub primary_output: PathBuf,
    /// Lossy distribution artifact (MP3)
    pub distribution_output: PathBuf,
}

impl MasteringRequest {
    pub fn new(
        input: impl Into<PathBuf>,
        preset_id: impl Into<String>,
        primary_output: impl Into<PathBuf>,
        distribution_output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.into(),
            preset_id: preset_id.into(),
            primary_output: primary_output.into(),
            distribution_output: distribution_output.into(),
        }
    }

    /// Place both artifacts in `dir` under a random job id, with the default
    /// formats' extensions
    pub fn in_directory(
        input: impl Into<PathBuf>,
        preset_id: impl Into<String>,
        dir: &Path,
    ) -> Self {
        let input = input.into();
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "master".to_string());
        let name = format!("{}-{}", stem, Uuid::new_v4().simple());

        Self {
            primary_output: dir.join(format!(
                "{}.{}",
                name,
                LosslessFormat::default().extension()
            )),
            distribution_output: dir.join(format!(
                "{}.{}",
                name,
                DistributionFormat::default().extension()
            )),
            input,
            preset_id: preset_id.into(),
        }
    }
}

/// Outcome of a successful job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasteringResult {
    /// Id of the preset actually applied (the default when the requested id was unknown)
    pub preset_id: String,
    pub input_analysis: AnalysisResult,
    pub output_analysis: AnalysisResult,
    pub applied_gain_db: f64,
    pub corrective_pass_applied: bool,
    pub primary_artifact: PathBuf,
    pub distribution_artifact: PathBuf,
    /// Stages of the primary render
    pub stages: Vec<FilterStage>,
}

/// In-memory record of one invocation, owned by the orchestrator
#[derive(Debug)]
pub(crate) struct MasteringJob {
    pub request: MasteringRequest,
    pub preset: Preset,
    pub status: JobStatus,
    pub gain_db: f64,
    pub stages: Vec<FilterStage>,
    pub input_analysis: Option<AnalysisResult>,
    pub output_analysis: Option<AnalysisResult>,
    pub corrective_pass_applied: bool,
    /// Files this job has written, removed again if the job fails
    pub artifacts: Vec<PathBuf>,
}

impl MasteringJob {
    pub fn new(request: MasteringRequest, preset: Preset) -> Self {
        Self {
            request,
            preset,
            status: JobStatus::Start,
            gain_db: 0.0,
            stages: Vec::new(),
            input_analysis: None,
            output_analysis: None,
            corrective_pass_applied: false,
            artifacts: Vec::new(),
        }
    }

    pub fn advance(&mut self, next: JobStatus) {
        tracing::debug!(
            "Job {}: {} -> {}",
            self.request.input.display(),
            self.status,
            next
        );
        self.status = next;
    }

    pub fn track_artifact(&mut self, path: &Path) {
        if !self.artifacts.iter().any(|p| p == path) {
            self.artifacts.push(path.to_path_buf());
        }
    }

    pub fn forget_artifact(&mut self, path: &Path) {
        self.artifacts.retain(|p| p != path);
    }

    /// Convert into the caller-facing result
    ///
    /// Only called once the job reached `Done`, by which point both readings are set.
    pub fn into_result(self) -> MasteringResult {
        debug_assert_eq!(self.status, JobStatus::Done);
        MasteringResult {
            preset_id: self.preset.id,
            input_analysis: self.input_analysis.unwrap_or_default(),
            output_analysis: self.output_analysis.unwrap_or_default(),
            applied_gain_db: self.gain_db,
            corrective_pass_applied: self.corrective_pass_applied,
            primary_artifact: self.request.primary_output,
            distribution_artifact: self.request.distribution_output,
            stages: self.stages,
        }
    }
}
