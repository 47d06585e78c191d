mod args;
mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use looper_core::{
    build_loop_graph, load_config_or_default, validate_config, BatchEvent, BatchOrchestrator,
    CapabilityGate, Config, FfmpegTranscoder, FfprobeProber, LoopParameters, MediaProber,
    Readiness,
};

use args::{codec_or_default, Cli, Commands, LoopArgs};
use render::{exit_status, wants_install, EventPrinter};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Config file picked up from the working directory when none is named
const DEFAULT_CONFIG_FILE: &str = "looper.toml";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(status) => std::process::exit(status),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let config = load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            sources,
            output_dir,
            loop_args,
            install,
            json,
        } => run_command(&config, sources, output_dir, &loop_args, install, json).await,
        Commands::Check { codec } => {
            let gate = CapabilityGate::new(config.transcoder.clone());
            let codec = codec_or_default(codec, &config.defaults);
            Ok(report_readiness(&gate, gate.ensure_ready(codec).await).await)
        }
        Commands::Install => install_command(&config).await,
        Commands::Probe { file } => probe_command(&config, &file).await,
        Commands::Graph {
            duration,
            fps,
            loop_args,
        } => graph_command(&config, duration, fps, &loop_args),
    }
}

fn load(path: Option<&Path>) -> Result<Config> {
    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    let path = path.or_else(|| default_path.exists().then_some(default_path));

    match path {
        Some(p) => info!("Loading configuration from {:?}", p),
        None => info!("No configuration file, using defaults"),
    }
    let config = load_config_or_default(path)
        .with_context(|| format!("Failed to load config from {:?}", path))?;
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

async fn run_command(
    config: &Config,
    sources: Vec<PathBuf>,
    output_dir: PathBuf,
    loop_args: &LoopArgs,
    install: bool,
    json: bool,
) -> Result<i32> {
    let params = loop_args.resolve(&config.defaults);
    params.validate().context("Invalid loop settings")?;

    info!("looper v{}", VERSION);
    let gate = Arc::new(CapabilityGate::new(config.transcoder.clone()));
    let orchestrator = BatchOrchestrator::new(
        config.batch.clone(),
        Arc::new(FfprobeProber::new(config.transcoder.ffprobe_path.clone())),
        Arc::new(FfmpegTranscoder::new(config.transcoder.clone())),
        gate.clone(),
    );

    let mut printer = EventPrinter::new(json);
    let mut terminal = submit_and_follow(&orchestrator, &sources, params, &output_dir, &mut printer).await?;

    if install && terminal.as_ref().is_some_and(wants_install) {
        info!("Installing FFmpeg before retrying");
        gate.install().await.context("FFmpeg install failed")?;
        terminal = submit_and_follow(&orchestrator, &sources, params, &output_dir, &mut printer).await?;
    }

    Ok(exit_status(terminal.as_ref()))
}

/// Runs one batch to its end, printing events and cancelling on Ctrl+C.
async fn submit_and_follow(
    orchestrator: &BatchOrchestrator,
    sources: &[PathBuf],
    params: LoopParameters,
    output_dir: &Path,
    printer: &mut EventPrinter,
) -> Result<Option<BatchEvent>> {
    let mut handle = orchestrator
        .submit_batch(sources.to_vec(), params, output_dir)
        .context("Failed to start batch")?;
    info!("Batch {} submitted", handle.batch_id());

    let token = handle.cancellation_token();
    let watcher = tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Interrupted, cancelling batch");
        token.cancel();
    });

    let mut terminal = None;
    while let Some(event) = handle.next_event().await {
        printer.print(&event);
        if event.is_terminal() {
            terminal = Some(event);
        }
    }
    watcher.abort();

    Ok(terminal)
}

async fn install_command(config: &Config) -> Result<i32> {
    let gate = CapabilityGate::new(config.transcoder.clone());
    gate.install().await.context("FFmpeg install failed")?;
    println!("FFmpeg installed");

    let codec = codec_or_default(None, &config.defaults);
    Ok(report_readiness(&gate, gate.ensure_ready(codec).await).await)
}

async fn report_readiness(gate: &CapabilityGate, readiness: Readiness) -> i32 {
    let version = gate.snapshot().await.and_then(|c| c.version);
    match &readiness {
        Readiness::Ready { path } => {
            println!("FFmpeg: {}", path.display());
            if let Some(version) = version {
                println!("{}", version);
            }
            0
        }
        other => {
            println!("{}", other);
            1
        }
    }
}

async fn probe_command(config: &Config, file: &Path) -> Result<i32> {
    let prober = FfprobeProber::new(config.transcoder.ffprobe_path.clone());
    let video = prober
        .probe(file)
        .await
        .with_context(|| format!("Failed to probe {:?}", file))?;
    println!("{}", serde_json::to_string_pretty(&video)?);
    Ok(0)
}

fn graph_command(config: &Config, duration: f64, fps: f64, loop_args: &LoopArgs) -> Result<i32> {
    let params = loop_args.resolve(&config.defaults);
    params.validate().context("Invalid loop settings")?;

    let requested = params.overlap.to_seconds(fps);
    let graph = build_loop_graph(requested, duration, fps);
    if graph.overlap_was_clamped(requested) {
        warn!(
            "Overlap {:.3}s adjusted for a {:.3}s clip, using {:.3}s",
            requested, duration, graph.overlap_secs
        );
    }
    println!("{}", graph.description());
    Ok(0)
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
