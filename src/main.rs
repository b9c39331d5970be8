// SYNOID Digest Entry Point
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use synoid_digest::engine::ScoreAggregator;
use synoid_digest::quality;
use synoid_digest::{io, DigestConfig, DigestEngine, DigestInput};

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "synoid-digest")]
#[command(about = "SYNOID Digest - budgeted video summary selection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select, refine and assemble a budgeted summary
    Summarize {
        /// Scene segments JSON
        #[arg(short, long)]
        segments: PathBuf,

        /// Global per-frame importance scores JSON
        #[arg(long)]
        scores: Option<PathBuf>,

        /// Sampling rate of the score track and feature frames
        #[arg(long)]
        fps: Option<f64>,

        /// Feature vectors: per-frame matrix or segment_id -> vector map
        #[arg(short, long)]
        features: Option<PathBuf>,

        /// Transcript cues JSON (whisper format)
        #[arg(long)]
        cues: Option<PathBuf>,

        /// Config file (otherwise $SYNOID_DIGEST_CONFIG, ./digest_config.json, user config dir)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Selection strategy: knapsack or greedy
        #[arg(long)]
        strategy: Option<String>,

        /// Summary length in seconds
        #[arg(short, long)]
        budget_time: Option<f64>,

        /// Summary length as a fraction of the video
        #[arg(short, long)]
        top_ratio: Option<f64>,

        /// Greedy mixing weight (1.0 = importance only)
        #[arg(short, long)]
        mixing_weight: Option<f64>,

        /// Source video length in seconds
        #[arg(long)]
        video_duration: Option<f64>,

        /// Output order: start or id
        #[arg(long)]
        order: Option<String>,

        /// Output JSON path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rank the best standalone highlight clips
    Clips {
        #[arg(short, long)]
        segments: PathBuf,

        #[arg(long)]
        scores: Option<PathBuf>,

        #[arg(long)]
        fps: Option<f64>,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of clips to keep
        #[arg(short = 'n', long)]
        top_n: Option<usize>,

        /// Shortest acceptable clip in seconds
        #[arg(long)]
        min_duration: Option<f64>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score a finished summary against the full video
    Evaluate {
        /// All original segments
        #[arg(short, long)]
        segments: PathBuf,

        /// Selected segments or a summarize output file
        #[arg(long)]
        selected: PathBuf,

        #[arg(short, long)]
        features: PathBuf,

        /// Weight of RCI_SPS against representativeness
        #[arg(short, long, default_value_t = 0.5)]
        weight: f64,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

async fn emit<T: serde::Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => io::write_json(path, value).await,
        None => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // Global panic handler: log panics instead of crashing silently
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[SYNOID PANIC] at {}: {}", location, message);
    }));

    let args = Cli::parse();

    match args.command {
        Commands::Summarize {
            segments,
            scores,
            fps,
            features,
            cues,
            config,
            strategy,
            budget_time,
            top_ratio,
            mixing_weight,
            video_duration,
            order,
            output,
        } => {
            let mut cfg = DigestConfig::load(config.as_deref())?;
            if let Some(s) = strategy {
                cfg.strategy = s.parse()?;
            }
            // A budget flag replaces whichever budget the config carried.
            if budget_time.is_some() || top_ratio.is_some() {
                cfg.budget_time = budget_time;
                cfg.top_ratio = top_ratio;
            }
            if let Some(w) = mixing_weight {
                cfg.mixing_weight = w;
            }
            if let Some(f) = fps {
                cfg.fps = f;
            }
            if let Some(o) = order {
                cfg.output_order = o.parse()?;
            }

            let mut input = DigestInput::new(io::load_segments(&segments).await?);
            input.video_duration = video_duration;
            if let Some(path) = scores {
                input.score_track = Some(io::load_scores(&path).await?);
            }
            if let Some(path) = features {
                input.features = Some(io::load_features(&path).await?);
            }
            if let Some(path) = cues {
                input.cues = io::load_cues(&path).await?;
            }

            info!("[DIGEST] Summarizing with {:?} strategy", cfg.strategy);
            let engine = DigestEngine::new(cfg);
            let report = tokio::task::spawn_blocking(move || engine.run(input)).await??;

            for w in &report.warnings {
                warn!("[DIGEST] Segment {}: {:?}", w.segment_id(), w);
            }
            info!(
                "[DIGEST] {} segments, {:.2}s of {:.2}s ({:.1}%)",
                report.output.segments.len(),
                report.output.selected_duration,
                report.output.original_duration,
                report.output.compression_ratio * 100.0
            );
            emit(&report, output.as_deref()).await?;
        }
        Commands::Clips {
            segments,
            scores,
            fps,
            config,
            top_n,
            min_duration,
            output,
        } => {
            let mut cfg = DigestConfig::load(config.as_deref())?;
            if let Some(n) = top_n {
                cfg.top_n = n;
            }
            if let Some(d) = min_duration {
                cfg.min_clip_duration = d;
            }
            if let Some(f) = fps {
                cfg.fps = f;
            }

            let mut input = DigestInput::new(io::load_segments(&segments).await?);
            if let Some(path) = scores {
                input.score_track = Some(io::load_scores(&path).await?);
            }

            let engine = DigestEngine::new(cfg);
            let (clips, warnings) = tokio::task::spawn_blocking(move || engine.rank_clips(input)).await??;
            for w in &warnings {
                warn!("[CLIPS] Segment {}: {:?}", w.segment_id(), w);
            }
            emit(&clips, output.as_deref()).await?;
        }
        Commands::Evaluate {
            segments,
            selected,
            features,
            weight,
            config,
            output,
        } => {
            let cfg = DigestConfig::load(config.as_deref())?;
            let mut all = io::load_segments(&segments).await?;
            let picks = io::load_selected(&selected).await?;
            let source = io::load_features(&features).await?;

            let aggregator = ScoreAggregator::from_config(&cfg);
            for seg in all.iter_mut().filter(|s| !s.frame_scores().is_empty()) {
                aggregator.aggregate(seg)?;
            }
            source.attach(&mut all, cfg.fps);

            let report = tokio::task::spawn_blocking(move || quality::evaluate(&all, &picks, weight)).await?;
            info!("[EVAL] Summary quality: {}", report.score);
            emit(&report, output.as_deref()).await?;
        }
        Commands::Config { config, output } => {
            let cfg = DigestConfig::load(config.as_deref())?;
            if let Err(e) = cfg.validate() {
                warn!("[DIGEST] {}", e);
            }
            emit(&cfg, output.as_deref()).await?;
        }
    }

    Ok(())
}
