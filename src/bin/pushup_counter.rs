//! pushup_counter - headless repetition counting loop
//!
//! This binary:
//! 1. Loads layered configuration (file, env, flags)
//! 2. Loads the configured pose backend into a model handle
//! 3. Feeds frames from the configured source through the pipeline
//! 4. Stops on Ctrl-C, source exhaustion or `--max-frames`
//! 5. Prints a summary (plain or JSON)

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use pushup_counter::ui::Ui;
use pushup_counter::{AppConfig, FramePipeline, FrameSource, Tick};

#[derive(Parser, Debug)]
#[command(
    name = "pushup_counter",
    about = "Count push-up repetitions from a frame source"
)]
struct Args {
    /// Config file (.toml, otherwise JSON). Falls back to PUSHUP_CONFIG.
    #[arg(long, value_name = "PATH", env = "PUSHUP_CONFIG")]
    config: Option<PathBuf>,

    /// Frame source override (stub://<name> or an image directory)
    #[arg(long, value_name = "URI")]
    source: Option<String>,

    /// Stop after this many frames
    #[arg(long, value_name = "N")]
    max_frames: Option<u64>,

    /// Pace frames at the source's target fps
    #[arg(long)]
    realtime: bool,

    /// Print the summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

#[derive(Debug, Serialize)]
struct Summary {
    source: String,
    backend: String,
    frames_processed: u64,
    frames_skipped: u64,
    frames_dropped: u64,
    reps: u32,
    elapsed_ms: u128,
    mean_inference_ms: Option<f64>,
    inference_fps: Option<u32>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let ui = Ui::from_args(Some(&args.ui), std::io::stderr().is_terminal());

    let mut cfg = {
        let _stage = ui.stage("Load configuration");
        AppConfig::load_with(args.config.as_deref())?
    };
    if let Some(source) = args.source {
        cfg.source.uri = source;
    }
    if args.max_frames.is_some() {
        cfg.source.max_frames = args.max_frames;
    }

    let mut pipeline = {
        let _stage = ui.stage("Load pose model");
        FramePipeline::from_config(&cfg)?
    };
    let backend = pipeline
        .handle()
        .backend_name()
        .unwrap_or("none")
        .to_string();

    let mut source = FrameSource::new(cfg.source.clone())?;
    {
        let _stage = ui.stage("Connect frame source");
        source
            .connect()
            .with_context(|| format!("failed to connect to {}", cfg.source.uri))?;
    }

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .map_err(|e| anyhow!("error setting Ctrl-C handler: {e}"))?;

    let frame_interval = Duration::from_secs_f64(1.0 / f64::from(cfg.source.target_fps));
    let started = Instant::now();
    let mut ticker = ui.rep_ticker();
    let mut processed = 0u64;
    let mut skipped = 0u64;

    log::info!("counting from {} (Ctrl-C to stop)", cfg.source.uri);
    loop {
        if rx.try_recv().is_ok() {
            log::info!("shutdown signal received, stopping...");
            break;
        }
        if cfg.source.max_frames.is_some_and(|max| processed >= max) {
            break;
        }

        let tick_start = Instant::now();
        let Some(frame) = source.next_usable_frame()? else {
            log::info!("frame source exhausted");
            break;
        };
        let report = pipeline.process(&frame)?;
        processed += 1;
        if matches!(report.tick, Tick::Skipped { .. }) {
            skipped += 1;
        }
        ticker.update(report.sequence, report.state);

        if args.realtime {
            let spent = tick_start.elapsed();
            if spent < frame_interval {
                std::thread::sleep(frame_interval - spent);
            }
        }
    }

    let state = pipeline.state();
    let inference = pipeline.inference_stats();
    ticker.finish(state);
    pipeline.release();

    let stats = source.stats();
    let summary = Summary {
        source: stats.uri,
        backend,
        frames_processed: processed,
        frames_skipped: skipped,
        frames_dropped: stats.frames_dropped,
        reps: state.count,
        elapsed_ms: started.elapsed().as_millis(),
        mean_inference_ms: inference.mean_ms(),
        inference_fps: inference.fps(),
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "{} push-ups ({} frames, {} skipped, {} dropped)",
            summary.reps, summary.frames_processed, summary.frames_skipped, summary.frames_dropped
        );
        if let (Some(ms), Some(fps)) = (summary.mean_inference_ms, summary.inference_fps) {
            println!("inference: {ms:.1} ms/frame ({fps} fps)");
        }
    }
    Ok(())
}
