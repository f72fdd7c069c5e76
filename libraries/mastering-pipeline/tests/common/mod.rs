/// Common test utilities: a scripted renderer and job fixtures
use async_trait::async_trait;
use mastering_core::{FilterStage, PresetCatalog};
use mastering_pipeline::{
    DistributionFormat, LosslessFormat, MasteringOrchestrator, MasteringSettings, RenderError,
    Renderer,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// One recorded renderer invocation
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Measure(PathBuf),
    Render {
        input: PathBuf,
        output: PathBuf,
        stages: Vec<FilterStage>,
    },
    Transcode {
        input: PathBuf,
        output: PathBuf,
    },
}

/// Renderer that answers measurements from a script and writes placeholder files
///
/// Each `measure` call pops the next integrated loudness from the queue; once
/// the queue is drained it answers with the fallback reading, or with output
/// that contains no reading at all.
#[derive(Default)]
pub struct ScriptedRenderer {
    readings: Mutex<VecDeque<f64>>,
    fallback: Option<f64>,
    peak_db: f64,
    /// Zero-based index of the measure call that fails
    fail_measure: Option<usize>,
    /// Zero-based index of the render call that fails
    fail_render: Option<usize>,
    fail_transcode: bool,
    render_delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
    pub render_started: Notify,
}

impl ScriptedRenderer {
    pub fn new(readings: impl IntoIterator<Item = f64>) -> Self {
        Self {
            readings: Mutex::new(readings.into_iter().collect()),
            peak_db: -1.0,
            ..Default::default()
        }
    }

    pub fn with_fallback(mut self, lufs: f64) -> Self {
        self.fallback = Some(lufs);
        self
    }

    pub fn failing_measure(mut self, index: usize) -> Self {
        self.fail_measure = Some(index);
        self
    }

    pub fn failing_render(mut self, index: usize) -> Self {
        self.fail_render = Some(index);
        self
    }

    pub fn failing_transcode(mut self) -> Self {
        self.fail_transcode = true;
        self
    }

    pub fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn render_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Render { .. }))
            .collect()
    }

    pub fn measure_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Measure(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub const FAILURE_DIAGNOSTIC: &str = "Error while filtering: Invalid argument";

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn measure(&self, input: &Path) -> Result<String, RenderError> {
        let index = self.measure_calls();
        self.record(Call::Measure(input.to_path_buf()));

        if self.fail_measure == Some(index) {
            return Err(RenderError::Failed {
                status: "exit status: 1".to_string(),
                diagnostic: FAILURE_DIAGNOSTIC.to_string(),
            });
        }

        let reading = self.readings.lock().unwrap().pop_front().or(self.fallback);
        Ok(match reading {
            Some(lufs) => format!(
                "[Parsed_ebur128_0 @ 0x1] Summary:\n\n  Integrated loudness:\n    I:  {:.1} LUFS\n\n  True peak:\n    Peak:  {:.1} dBFS\n",
                lufs, self.peak_db
            ),
            None => "Input #0, wav, from 'x.wav':\n".to_string(),
        })
    }

    async fn render(
        &self,
        input: &Path,
        output: &Path,
        stages: &[FilterStage],
        _format: LosslessFormat,
    ) -> Result<(), RenderError> {
        let index = self.render_calls().len();
        self.record(Call::Render {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            stages: stages.to_vec(),
        });
        self.render_started.notify_one();

        if let Some(delay) = self.render_delay {
            tokio::time::sleep(delay).await;
        }

        // Partial output is written before failing, like a render that dies midway
        std::fs::write(output, b"RIFF").unwrap();

        if self.fail_render == Some(index) {
            return Err(RenderError::Failed {
                status: "exit status: 1".to_string(),
                diagnostic: FAILURE_DIAGNOSTIC.to_string(),
            });
        }
        Ok(())
    }

    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        _format: DistributionFormat,
    ) -> Result<(), RenderError> {
        self.record(Call::Transcode {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
        });

        std::fs::write(output, b"ID3").unwrap();

        if self.fail_transcode {
            return Err(RenderError::Failed {
                status: "exit status: 1".to_string(),
                diagnostic: FAILURE_DIAGNOSTIC.to_string(),
            });
        }
        Ok(())
    }
}

/// Orchestrator over `renderer` with the built-in catalog
pub fn orchestrator(renderer: &Arc<ScriptedRenderer>) -> MasteringOrchestrator {
    orchestrator_with(renderer, MasteringSettings::default())
}

pub fn orchestrator_with(
    renderer: &Arc<ScriptedRenderer>,
    settings: MasteringSettings,
) -> MasteringOrchestrator {
    MasteringOrchestrator::new(
        Arc::clone(renderer) as Arc<dyn Renderer>,
        Arc::new(PresetCatalog::builtin()),
        settings,
    )
}

/// Create a placeholder input file; the scripted renderer never reads it
pub fn input_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"RIFF").unwrap();
    path
}

/// Files left in `dir` other than `keep`
pub fn leftover_files(dir: &Path, keep: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path != keep)
        .collect()
}
