/// Mastering CLI - batch mastering through FFmpeg
use anyhow::Context;
use clap::{Parser, Subcommand};
use mastering_cli::MasteringConfig;
use mastering_core::{AnalysisResult, PresetFamily, UNMEASURED_PEAK_DB};
use mastering_pipeline::{
    filter_graph, CancellationToken, CountingStats, MasteringOrchestrator, MasteringRequest,
    MasteringResult, Renderer, StatsRecorder,
};
use std::{path::PathBuf, sync::Arc};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mastering-cli")]
#[command(about = "Automated loudness-targeted audio mastering", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "MASTERING_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Master one or more audio files
    Master {
        /// Input files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Preset id (defaults to the catalog default)
        #[arg(short, long)]
        preset: Option<String>,
        /// Directory for the mastered WAV and MP3 files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
        /// Jobs run at the same time
        #[arg(short, long, default_value_t = 2)]
        jobs: usize,
        /// Print results as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Measure integrated loudness and true peak of a file
    Analyze {
        /// Input file
        input: PathBuf,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List available presets
    Presets,
    /// Show the filter chain a preset would render for a given input loudness
    Chain {
        /// Preset id
        preset: String,
        /// Measured integrated loudness of the input (LUFS)
        #[arg(long, allow_hyphen_values = true)]
        lufs: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mastering_cli=info,mastering_pipeline=info,mastering_core=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = MasteringConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Master {
            inputs,
            preset,
            output_dir,
            jobs,
            json,
        } => {
            master(&config, inputs, preset, output_dir, jobs, json).await?;
        }
        Commands::Analyze { input, json } => {
            analyze(&config, input, json).await?;
        }
        Commands::Presets => {
            list_presets(&config)?;
        }
        Commands::Chain { preset, lufs } => {
            show_chain(&config, &preset, lufs)?;
        }
    }

    Ok(())
}

fn orchestrator(config: &MasteringConfig) -> anyhow::Result<MasteringOrchestrator> {
    let renderer: Arc<dyn Renderer> = Arc::new(config.renderer());
    let catalog = Arc::new(config.catalog()?);
    Ok(MasteringOrchestrator::new(
        renderer,
        catalog,
        config.mastering.clone(),
    ))
}

/// Token cancelled on Ctrl-C
fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling running jobs");
            cancel.cancel();
        }
    });
    token
}

async fn master(
    config: &MasteringConfig,
    inputs: Vec<PathBuf>,
    preset: Option<String>,
    output_dir: PathBuf,
    jobs: usize,
    json: bool,
) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let stats = Arc::new(CountingStats::new());
    let orchestrator =
        Arc::new(orchestrator(config)?.with_stats(Arc::clone(&stats) as Arc<dyn StatsRecorder>));
    let preset_id = preset.unwrap_or_else(|| orchestrator.catalog().default_preset().id.clone());
    let cancel = cancel_on_interrupt();
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let total = inputs.len();

    tracing::info!(
        "Mastering {} file(s) with preset '{}' ({} at a time)",
        total,
        preset_id,
        jobs.max(1)
    );

    let mut tasks = JoinSet::new();
    for input in inputs {
        let request = MasteringRequest::in_directory(input, preset_id.clone(), &output_dir);
        let orchestrator = Arc::clone(&orchestrator);
        let semaphore = Arc::clone(&semaphore);
        let cancel = cancel.clone();

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let input = request.input.clone();
            (input, orchestrator.master(request, &cancel).await)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (input, outcome) = joined?;
        match outcome {
            Ok(result) if json => println!("{}", serde_json::to_string(&result)?),
            Ok(result) => print_result(&input, &result),
            Err(e) => eprintln!("{}: {}", input.display(), e),
        }
    }

    tracing::info!(
        "{} completed, {} failed",
        stats.completed(),
        stats.failed()
    );
    for (preset, count) in stats.completed_by_preset() {
        tracing::debug!("  {}: {}", preset, count);
    }

    if stats.failed() > 0 {
        anyhow::bail!("{} of {} job(s) failed", stats.failed(), total);
    }
    Ok(())
}

fn print_result(input: &std::path::Path, result: &MasteringResult) {
    println!("{} [{}]", input.display(), result.preset_id);
    println!("  input:       {}", result.input_analysis);
    println!("  output:      {}", result.output_analysis);
    println!(
        "  gain:        {:+.1} dB{}",
        result.applied_gain_db,
        if result.corrective_pass_applied {
            " (corrective pass applied)"
        } else {
            ""
        }
    );
    println!("  master:      {}", result.primary_artifact.display());
    println!("  deliverable: {}", result.distribution_artifact.display());
}

async fn analyze(config: &MasteringConfig, input: PathBuf, json: bool) -> anyhow::Result<()> {
    let orchestrator = orchestrator(config)?;
    let analysis = orchestrator.analyze(&input, &cancel_on_interrupt()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!("{}: {}", input.display(), analysis);
    }
    Ok(())
}

fn list_presets(config: &MasteringConfig) -> anyhow::Result<()> {
    let catalog = config.catalog()?;
    let default_id = catalog.default_preset().id.as_str();

    println!("Presets:");
    for preset in catalog.iter() {
        let family = match preset.family() {
            PresetFamily::Parametric => "parametric",
            PresetFamily::Custom => "custom",
        };
        println!(
            "  {}{:<14} {:<10} {:>6.1} LUFS {:>5.1} dBTP  {}",
            if preset.id == default_id { "*" } else { " " },
            preset.id,
            family,
            preset.target_lufs,
            preset.true_peak_ceiling_db,
            preset.description
        );
    }
    Ok(())
}

fn show_chain(config: &MasteringConfig, preset_id: &str, lufs: f64) -> anyhow::Result<()> {
    let catalog = config.catalog()?;
    let preset = catalog.lookup(preset_id);
    let input = AnalysisResult::new(lufs, UNMEASURED_PEAK_DB);
    let chain = config.mastering.chain_builder().build(preset, &input);

    println!(
        "Preset '{}' for {:.1} LUFS input (gain {:+.2} dB):",
        preset.id, lufs, chain.gain_db
    );
    for (i, stage) in chain.stages.iter().enumerate() {
        println!("  {}. {}", i + 1, stage);
    }
    println!();
    println!("{}", filter_graph(&chain.stages));
    Ok(())
}
