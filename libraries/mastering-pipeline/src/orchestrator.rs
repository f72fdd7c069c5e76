//! Mastering job orchestration
//!
//! Drives one job through analysis, chain building, the primary render,
//! verification, an optional corrective pass and the distribution encode.
//! Each renderer call is bounded by the configured timeout and aborts as
//! soon as the caller's cancellation token fires.

use crate::{
    analyzer::LoudnessAnalyzer,
    error::{MasteringError, RenderError, Result},
    job::{JobStatus, MasteringJob, MasteringRequest, MasteringResult},
    renderer::Renderer,
    settings::MasteringSettings,
    stats::{NoopStats, StatsRecorder},
};
use mastering_core::{
    AnalysisResult, ChainBuilder, FilterChain, FilterStage, NormalizeSettings, PresetCatalog,
};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Runs mastering jobs against a shared renderer and preset catalog
///
/// Cheap to share behind an `Arc`; jobs don't share mutable state, so any
/// number can run concurrently as long as their output paths differ.
pub struct MasteringOrchestrator {
    renderer: Arc<dyn Renderer>,
    analyzer: LoudnessAnalyzer,
    catalog: Arc<PresetCatalog>,
    builder: ChainBuilder,
    settings: MasteringSettings,
    stats: Arc<dyn StatsRecorder>,
}

impl MasteringOrchestrator {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        catalog: Arc<PresetCatalog>,
        settings: MasteringSettings,
    ) -> Self {
        Self {
            analyzer: LoudnessAnalyzer::new(Arc::clone(&renderer)),
            builder: settings.chain_builder(),
            renderer,
            catalog,
            settings,
            stats: Arc::new(NoopStats),
        }
    }

    /// Report completions and failures to `stats`
    pub fn with_stats(mut self, stats: Arc<dyn StatsRecorder>) -> Self {
        self.stats = stats;
        self
    }

    pub fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &MasteringSettings {
        &self.settings
    }

    /// Measure a file without mastering it
    pub async fn analyze(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult> {
        if tokio::fs::metadata(path).await.is_err() {
            return Err(MasteringError::InputNotFound(path.to_path_buf()));
        }

        self.guarded(JobStatus::AnalyzeInput, cancel, self.analyzer.analyze(path))
            .await
    }

    /// Chain that `preset_id` would render for an input measuring `input`
    pub fn preview_chain(&self, preset_id: &str, input: &AnalysisResult) -> FilterChain {
        self.builder.build(self.catalog.lookup(preset_id), input)
    }

    /// Master one file
    ///
    /// On failure every artifact the job wrote is removed again and the
    /// error names the stage that failed.
    pub async fn master(
        &self,
        request: MasteringRequest,
        cancel: &CancellationToken,
    ) -> Result<MasteringResult> {
        let preset = self.catalog.lookup(&request.preset_id).clone();
        let preset_id = preset.id.clone();
        let started = Instant::now();

        tracing::info!(
            "Mastering {} with preset '{}'",
            request.input.display(),
            preset_id
        );

        let mut job = MasteringJob::new(request, preset);

        match self.run(&mut job, cancel).await {
            Ok(()) => {
                job.advance(JobStatus::Done);
                self.stats.record_completion(&preset_id);

                let result = job.into_result();
                tracing::info!(
                    "Mastered {} in {:.1}s: {} -> {} (gain {:+.1} dB{})",
                    result.primary_artifact.display(),
                    started.elapsed().as_secs_f64(),
                    result.input_analysis,
                    result.output_analysis,
                    result.applied_gain_db,
                    if result.corrective_pass_applied {
                        ", corrected"
                    } else {
                        ""
                    }
                );
                Ok(result)
            }
            Err(e) => {
                job.advance(JobStatus::Failed);
                tracing::error!(
                    "Mastering {} failed: {}",
                    job.request.input.display(),
                    e
                );
                if let Some(diagnostic) = e.diagnostic() {
                    tracing::error!("Render engine diagnostic:\n{}", diagnostic);
                }

                remove_artifacts(&job.artifacts).await;
                self.stats.record_failure(&preset_id);
                Err(e)
            }
        }
    }

    async fn run(&self, job: &mut MasteringJob, cancel: &CancellationToken) -> Result<()> {
        let input = job.request.input.clone();
        let primary = job.request.primary_output.clone();

        if tokio::fs::metadata(&input).await.is_err() {
            return Err(MasteringError::InputNotFound(input));
        }

        job.advance(JobStatus::AnalyzeInput);
        let input_analysis = self
            .guarded(job.status, cancel, self.analyzer.analyze(&input))
            .await?;
        job.input_analysis = Some(input_analysis);
        tracing::info!("Input {}: {}", input.display(), input_analysis);

        job.advance(JobStatus::BuildChain);
        let chain = self.builder.build(&job.preset, &input_analysis);
        tracing::debug!(
            "Chain for '{}': {} stages, gain {:+.2} dB",
            job.preset.id,
            chain.len(),
            chain.gain_db
        );
        job.gain_db = chain.gain_db;
        job.stages = chain.stages;

        job.advance(JobStatus::RenderPrimary);
        job.track_artifact(&primary);
        self.guarded(
            job.status,
            cancel,
            self.renderer.render(
                &input,
                &primary,
                &job.stages,
                self.settings.lossless_format(),
            ),
        )
        .await?;

        job.advance(JobStatus::AnalyzeOutput);
        let mut output_analysis = self
            .guarded(job.status, cancel, self.analyzer.analyze(&primary))
            .await?;

        let target = job.preset.target_lufs;
        let tolerance = self.settings.tolerance_for(&job.preset);
        let deviation = output_analysis.deviation_from(target);

        if deviation > tolerance {
            tracing::info!(
                "Output {:.1} LUFS misses target {:.1} LUFS by {:.2} LU (tolerance {:.1}), normalizing",
                output_analysis.integrated_lufs,
                target,
                deviation,
                tolerance
            );

            job.advance(JobStatus::CorrectivePass);
            self.corrective_pass(job, cancel).await?;
            job.corrective_pass_applied = true;

            job.advance(JobStatus::ReanalyzeFinal);
            output_analysis = self
                .guarded(job.status, cancel, self.analyzer.analyze(&primary))
                .await?;
        }
        job.output_analysis = Some(output_analysis);

        job.advance(JobStatus::TranscodeDeliverable);
        let distribution = job.request.distribution_output.clone();
        job.track_artifact(&distribution);
        self.guarded(
            job.status,
            cancel,
            self.renderer.transcode(
                &primary,
                &distribution,
                self.settings.distribution_format(),
            ),
        )
        .await?;

        Ok(())
    }

    /// Re-render the primary artifact through a single loudness normalization
    async fn corrective_pass(
        &self,
        job: &mut MasteringJob,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let primary = job.request.primary_output.clone();
        let staging = staging_path(&primary);

        tokio::fs::rename(&primary, &staging)
            .await
            .map_err(|source| MasteringError::Io {
                stage: job.status,
                source,
            })?;
        job.track_artifact(&staging);

        let normalize = FilterStage::LoudnessNormalize(NormalizeSettings {
            target_lufs: job.preset.target_lufs,
            true_peak_db: job.preset.true_peak_ceiling_db,
            loudness_range_max: self.settings.loudness_range_max,
            linear: true,
        });

        self.guarded(
            job.status,
            cancel,
            self.renderer.render(
                &staging,
                &primary,
                std::slice::from_ref(&normalize),
                self.settings.lossless_format(),
            ),
        )
        .await?;

        match tokio::fs::remove_file(&staging).await {
            Ok(()) => job.forget_artifact(&staging),
            Err(e) => tracing::warn!(
                "Failed to remove staging file {}: {}",
                staging.display(),
                e
            ),
        }

        Ok(())
    }

    /// Await a renderer call under the timeout and the cancellation token
    async fn guarded<T, F>(
        &self,
        stage: JobStatus,
        cancel: &CancellationToken,
        call: F,
    ) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, RenderError>>,
    {
        let limit = self.settings.render_timeout();

        tokio::select! {
            biased;

            () = cancel.cancelled() => Err(MasteringError::Cancelled { stage }),
            outcome = tokio::time::timeout(limit, call) => match outcome {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(source)) => Err(MasteringError::RenderEngine { stage, source }),
                Err(_) => Err(MasteringError::Timeout { stage, after: limit }),
            },
        }
    }
}

/// Unique sibling of `primary` that holds the uncorrected render
fn staging_path(primary: &Path) -> PathBuf {
    let stem = primary
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "master".to_string());

    primary.with_file_name(format!(
        "{}.{}.pre-correction.wav",
        stem,
        Uuid::new_v4().simple()
    ))
}

/// Best-effort removal; errors are logged and never replace the job's error
async fn remove_artifacts(paths: &[PathBuf]) {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => tracing::debug!("Removed partial artifact {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_path_is_unique_sibling() {
        let primary = Path::new("/out/song-1234.wav");
        let a = staging_path(primary);
        let b = staging_path(primary);

        assert_ne!(a, b);
        assert_eq!(a.parent(), primary.parent());
        let name = a.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("song-1234."));
        assert!(name.ends_with(".pre-correction.wav"));
    }

    #[tokio::test]
    async fn test_remove_artifacts_ignores_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.wav");
        std::fs::write(&present, b"RIFF").unwrap();

        remove_artifacts(&[present.clone(), dir.path().join("missing.wav")]).await;
        assert!(!present.exists());
    }
}
