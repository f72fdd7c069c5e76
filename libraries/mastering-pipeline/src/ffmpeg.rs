/// FFmpeg renderer
///
/// Every argument is passed to the process as its own `OsStr`; no shell is
/// involved and paths are never interpolated into a command line.
use crate::{
    error::RenderError,
    renderer::{DistributionFormat, LosslessFormat, Renderer},
};
use async_trait::async_trait;
use mastering_core::{FilterStage, ShelfKind};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Lines of stderr kept in error diagnostics
const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// acompressor's lowest accepted threshold (-60 dBFS)
const MIN_COMPRESSOR_THRESHOLD: f64 = 0.000_976_563;

/// alimiter's lowest accepted limit (-24 dBFS)
const MIN_LIMITER_LIMIT: f64 = 0.0625;

#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
    ffmpeg_path: PathBuf,
}

impl FfmpegRenderer {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }

    /// Run FFmpeg with `args`, returning its stderr on success
    async fn run(&self, args: Vec<OsString>) -> Result<String, RenderError> {
        tracing::debug!("Running {} {:?}", self.ffmpeg_path.display(), args);

        let output = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out or cancelled call drops this future; don't leave FFmpeg running
            .kill_on_drop(true)
            .output()
            .await?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            tracing::debug!("FFmpeg stderr:\n{}", stderr);
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                diagnostic: diagnostic_tail(&stderr),
            });
        }

        Ok(stderr)
    }
}

#[async_trait]
impl Renderer for FfmpegRenderer {
    async fn measure(&self, input: &Path) -> Result<String, RenderError> {
        self.run(measure_args(input)).await
    }

    async fn render(
        &self,
        input: &Path,
        output: &Path,
        stages: &[FilterStage],
        format: LosslessFormat,
    ) -> Result<(), RenderError> {
        self.run(render_args(input, output, stages, format)).await?;
        ensure_output(output).await
    }

    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        format: DistributionFormat,
    ) -> Result<(), RenderError> {
        self.run(transcode_args(input, output, format)).await?;
        ensure_output(output).await
    }
}

async fn ensure_output(output: &Path) -> Result<(), RenderError> {
    match tokio::fs::metadata(output).await {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(RenderError::MissingOutput(output.to_path_buf())),
    }
}

/// Arguments for an EBU R128 measurement pass
pub fn measure_args(input: &Path) -> Vec<OsString> {
    let mut args = base_args();
    args.push("-nostats".into());
    args.push("-i".into());
    args.push(input.into());
    args.push("-af".into());
    args.push("ebur128=peak=true".into());
    args.push("-f".into());
    args.push("null".into());
    args.push("-".into());
    args
}

/// Arguments for rendering through a stage list into the lossless format
pub fn render_args(
    input: &Path,
    output: &Path,
    stages: &[FilterStage],
    format: LosslessFormat,
) -> Vec<OsString> {
    let mut args = base_args();
    args.push("-y".into());
    args.push("-i".into());
    args.push(input.into());

    if !stages.is_empty() {
        args.push("-af".into());
        args.push(filter_graph(stages).into());
    }

    args.push("-ar".into());
    args.push(format.sample_rate.to_string().into());
    args.push("-c:a".into());
    args.push(pcm_codec(format.bit_depth).into());
    args.push("-f".into());
    args.push(format.extension().into());
    args.push(output.into());
    args
}

/// Arguments for encoding the distribution MP3
pub fn transcode_args(input: &Path, output: &Path, format: DistributionFormat) -> Vec<OsString> {
    let mut args = base_args();
    args.push("-y".into());
    args.push("-i".into());
    args.push(input.into());
    args.push("-c:a".into());
    args.push("libmp3lame".into());
    args.push("-b:a".into());
    args.push(format!("{}k", format.bitrate_kbps).into());
    args.push("-f".into());
    args.push(format.extension().into());
    args.push(output.into());
    args
}

fn base_args() -> Vec<OsString> {
    vec!["-hide_banner".into(), "-nostdin".into()]
}

fn pcm_codec(bit_depth: u16) -> &'static str {
    match bit_depth {
        16 => "pcm_s16le",
        32 => "pcm_s32le",
        _ => "pcm_s24le",
    }
}

/// Serialize stages into an FFmpeg audio filter graph, preserving order
pub fn filter_graph(stages: &[FilterStage]) -> String {
    stages
        .iter()
        .map(stage_filter)
        .collect::<Vec<_>>()
        .join(",")
}

/// FFmpeg filter expression for one stage
pub fn stage_filter(stage: &FilterStage) -> String {
    match stage {
        FilterStage::HighPass { freq_hz } => format!("highpass=f={}", num(*freq_hz)),
        FilterStage::Shelf {
            kind,
            freq_hz,
            gain_db,
        } => {
            let filter = match kind {
                ShelfKind::Low => "lowshelf",
                ShelfKind::High => "highshelf",
            };
            format!("{}=f={}:g={}", filter, num(*freq_hz), num(*gain_db))
        }
        FilterStage::Bell {
            freq_hz,
            gain_db,
            q,
        } => format!(
            "equalizer=f={}:t=q:w={}:g={}",
            num(*freq_hz),
            num(*q),
            num(*gain_db)
        ),
        FilterStage::Compressor(c) => format!(
            "acompressor=threshold={:.6}:ratio={}:attack={}:release={}",
            db_to_linear(c.threshold_db).clamp(MIN_COMPRESSOR_THRESHOLD, 1.0),
            num(c.ratio),
            num(c.attack_ms),
            num(c.release_ms)
        ),
        FilterStage::Limiter(l) => format!(
            "alimiter=limit={:.6}:attack={}:release={}:level=disabled",
            db_to_linear(l.ceiling_db).clamp(MIN_LIMITER_LIMIT, 1.0),
            num(l.attack_ms),
            num(l.release_ms)
        ),
        FilterStage::Gain { db } => format!("volume={}dB", num(*db)),
        FilterStage::LoudnessNormalize(n) => format!(
            "loudnorm=I={}:TP={}:LRA={}:linear={}",
            num(n.target_lufs),
            num(n.true_peak_db),
            num(n.loudness_range_max),
            n.linear
        ),
    }
}

fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Compact decimal: at most 3 fractional digits, trailing zeros dropped
fn num(value: f64) -> String {
    let formatted = format!("{:.3}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn diagnostic_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mastering_core::{CompressorSettings, LimiterSettings, NormalizeSettings};

    #[test]
    fn test_renderer_creation() {
        let renderer = FfmpegRenderer::new(PathBuf::from("/usr/bin/ffmpeg"));
        assert_eq!(renderer.ffmpeg_path(), Path::new("/usr/bin/ffmpeg"));
    }

    #[test]
    fn test_num_formatting() {
        assert_eq!(num(30.0), "30");
        assert_eq!(num(-1.5), "-1.5");
        assert_eq!(num(7.0), "7");
        assert_eq!(num(0.333_333), "0.333");
        assert_eq!(num(-0.0001), "0");
    }

    #[test]
    fn test_eq_filters() {
        assert_eq!(
            stage_filter(&FilterStage::HighPass { freq_hz: 30.0 }),
            "highpass=f=30"
        );
        assert_eq!(
            stage_filter(&FilterStage::Shelf {
                kind: ShelfKind::Low,
                freq_hz: 120.0,
                gain_db: 2.0
            }),
            "lowshelf=f=120:g=2"
        );
        assert_eq!(
            stage_filter(&FilterStage::Shelf {
                kind: ShelfKind::High,
                freq_hz: 12000.0,
                gain_db: -1.5
            }),
            "highshelf=f=12000:g=-1.5"
        );
        assert_eq!(
            stage_filter(&FilterStage::Bell {
                freq_hz: 350.0,
                gain_db: -2.0,
                q: 1.2
            }),
            "equalizer=f=350:t=q:w=1.2:g=-2"
        );
    }

    #[test]
    fn test_dynamics_filters_use_linear_levels() {
        let compressor = stage_filter(&FilterStage::Compressor(CompressorSettings {
            threshold_db: -20.0,
            ratio: 2.0,
            attack_ms: 10.0,
            release_ms: 120.0,
        }));
        assert_eq!(
            compressor,
            "acompressor=threshold=0.100000:ratio=2:attack=10:release=120"
        );

        let limiter = stage_filter(&FilterStage::Limiter(LimiterSettings {
            ceiling_db: -0.5,
            attack_ms: 3.0,
            release_ms: 40.0,
        }));
        assert_eq!(
            limiter,
            "alimiter=limit=0.944061:attack=3:release=40:level=disabled"
        );
    }

    #[test]
    fn test_out_of_range_levels_clamped() {
        let compressor = stage_filter(&FilterStage::Compressor(CompressorSettings {
            threshold_db: -90.0,
            ratio: 4.0,
            attack_ms: 5.0,
            release_ms: 50.0,
        }));
        assert!(compressor.starts_with("acompressor=threshold=0.000977:"));
    }

    #[test]
    fn test_gain_and_normalize_filters() {
        assert_eq!(stage_filter(&FilterStage::Gain { db: 7.0 }), "volume=7dB");
        assert_eq!(
            stage_filter(&FilterStage::Gain { db: -2.25 }),
            "volume=-2.25dB"
        );
        assert_eq!(
            stage_filter(&FilterStage::LoudnessNormalize(NormalizeSettings {
                target_lufs: -9.0,
                true_peak_db: -1.0,
                loudness_range_max: 20.0,
                linear: true,
            })),
            "loudnorm=I=-9:TP=-1:LRA=20:linear=true"
        );
    }

    #[test]
    fn test_filter_graph_preserves_order() {
        let stages = [
            FilterStage::HighPass { freq_hz: 30.0 },
            FilterStage::Gain { db: 3.0 },
            FilterStage::HighPass { freq_hz: 40.0 },
        ];
        assert_eq!(
            filter_graph(&stages),
            "highpass=f=30,volume=3dB,highpass=f=40"
        );
    }

    #[test]
    fn test_render_args_keep_paths_separate() {
        let input = Path::new("/music/my song; rm -rf.wav");
        let output = Path::new("/out/master $(id).wav");
        let args = render_args(
            input,
            output,
            &[FilterStage::Gain { db: 1.0 }],
            LosslessFormat::default(),
        );

        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "-hide_banner",
                "-nostdin",
                "-y",
                "-i",
                "/music/my song; rm -rf.wav",
                "-af",
                "volume=1dB",
                "-ar",
                "48000",
                "-c:a",
                "pcm_s24le",
                "-f",
                "wav",
                "/out/master $(id).wav",
            ]
        );
    }

    #[test]
    fn test_measure_and_transcode_args() {
        let measure: Vec<String> = measure_args(Path::new("in.flac"))
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(measure.contains(&"ebur128=peak=true".to_string()));
        assert_eq!(measure.last().map(String::as_str), Some("-"));

        let transcode: Vec<String> = transcode_args(
            Path::new("in.wav"),
            Path::new("out.mp3"),
            DistributionFormat::default(),
        )
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
        assert!(transcode.windows(2).any(|w| w == ["-b:a", "320k"]));
        assert!(transcode.windows(2).any(|w| w == ["-c:a", "libmp3lame"]));
    }

    #[test]
    fn test_diagnostic_tail() {
        let stderr: String = (0..50).map(|i| format!("line {}\n", i)).collect();
        let tail = diagnostic_tail(&stderr);
        assert_eq!(tail.lines().count(), DIAGNOSTIC_TAIL_LINES);
        assert!(tail.ends_with("line 49"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let renderer = FfmpegRenderer::new(PathBuf::from("/nonexistent/ffmpeg-binary"));
        let result = renderer.measure(Path::new("in.wav")).await;
        assert!(matches!(result, Err(RenderError::Spawn(_))));
    }
}
