//! demo - end-to-end synthetic run for the push-up counter
//!
//! Drives the synthetic source and backend through the full pipeline for a
//! known number of repetitions and checks the counter agrees.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::{IsTerminal, Write};

use pushup_counter::ui::Ui;
use pushup_counter::{
    AppConfig, FramePipeline, FrameSource, SourceSettings, SyntheticMotion, Tick, Transition,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Repetitions to simulate.
    #[arg(long, default_value_t = 5)]
    reps: u32,
    /// Frames per simulated repetition.
    #[arg(long, default_value_t = 20)]
    period: u32,
    /// Drop shoulder confidence on every Nth frame.
    #[arg(long)]
    occlude_every: Option<u32>,
    /// Emit every frame report as a JSON line on stdout.
    #[arg(long)]
    frames_json: bool,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.period < 4 {
        return Err(anyhow!("period must be >= 4 frames"));
    }
    let ui = Ui::from_args(Some(&args.ui), std::io::stderr().is_terminal());

    let mut cfg = AppConfig::load_with(None)?;
    cfg.source = SourceSettings {
        uri: "stub://demo".to_string(),
        ..SourceSettings::default()
    };
    cfg.model.motion = SyntheticMotion {
        period_frames: args.period,
        occlude_every: args.occlude_every,
        ..SyntheticMotion::default()
    };

    let mut pipeline = {
        let _stage = ui.stage("Load synthetic model");
        FramePipeline::from_config(&cfg)?
    };
    let mut source = FrameSource::new(cfg.source.clone())?;
    source.connect()?;

    let total_frames = u64::from(args.reps) * u64::from(args.period);
    let mut skipped = 0u64;
    let stdout = std::io::stdout();
    {
        let _stage = ui.stage("Count synthetic push-ups");
        for _ in 0..total_frames {
            let Some(frame) = source.next_usable_frame()? else {
                break;
            };
            let report = pipeline.process(&frame)?;
            match report.tick {
                Tick::Skipped { .. } => skipped += 1,
                Tick::Observed {
                    transition: Transition::RepCompleted { count },
                    ..
                } => log::info!("rep {count} at frame {}", report.sequence),
                Tick::Observed { .. } => {}
            }
            if args.frames_json {
                let mut out = stdout.lock();
                serde_json::to_writer(&mut out, &report)?;
                writeln!(out)?;
            }
        }
    }

    let counted = pipeline.state().count;
    pipeline.release();
    eprintln!(
        "demo: simulated {} reps over {total_frames} frames, counted {counted} ({skipped} skipped)",
        args.reps
    );
    if counted != args.reps {
        return Err(anyhow!(
            "counter disagreed with the simulation: expected {}, got {counted}",
            args.reps
        ));
    }
    Ok(())
}
