// SPDX-License-Identifier: MIT OR Apache-2.0
//! Automation Runner - headless timeline playback
//!
//! Loads a timeline document, drives the automation engine at a fixed tick
//! interval with logging handlers standing in for a real canvas, and prints
//! the final automation state as JSON.

mod host;

use automation_engine::{
    ConfigError, PlaybackError, PlaybackEvent, PlayerConfig, RecorderError, Timeline, TimelineError,
    TimelinePlayer,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Play an automation timeline headlessly
#[derive(Debug, Parser)]
#[command(name = "automation_runner", version, about)]
struct Args {
    /// Timeline JSON document
    timeline: PathBuf,

    /// Player configuration (RON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Speed multiplier, overriding the configuration
    #[arg(short, long)]
    speed: Option<f64>,

    /// Loop playback and stop after this many wraps
    #[arg(short, long)]
    loop_count: Option<u32>,

    /// Start from this global time in milliseconds
    #[arg(long)]
    start_at: Option<f64>,

    /// Sleep between ticks so playback runs at wall-clock pace
    #[arg(long)]
    realtime: bool,

    /// Record the run
    #[arg(long)]
    record: bool,
}

/// Error from a runner session
#[derive(Debug, thiserror::Error)]
enum RunnerError {
    /// Timeline file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error(transparent)]
    Recorder(#[from] RecorderError),

    /// Final state could not be serialized
    #[error("Failed to write state: {0}")]
    Output(#[from] serde_json::Error),
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("automation_engine=info".parse().unwrap())
        .add_directive("automation_runner=info".parse().unwrap());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Automation Runner v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    if let Err(e) = run(&args) {
        tracing::error!("Run failed: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), RunnerError> {
    let mut config = match &args.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    };
    if let Some(speed) = args.speed {
        config.speed = speed;
    }
    if args.loop_count.is_some() {
        config.loop_playback = true;
    }
    config.validate()?;

    let json = std::fs::read_to_string(&args.timeline).map_err(|source| RunnerError::Read {
        path: args.timeline.clone(),
        source,
    })?;
    let timeline = Timeline::from_json(&json)?;

    let mut player = TimelinePlayer::with_config(&config);
    host::register_logging_handlers(&mut player);
    player.set_recorder(Box::new(host::LogRecorder::default()));
    player.load_timeline(timeline);

    if let Some(start) = args.start_at {
        player.seek(start)?;
    }
    if args.record {
        player.record()?;
    }
    player.play()?;

    let max_loops = match args.loop_count {
        Some(count) => Some(count),
        None if config.loop_playback && !args.realtime => {
            tracing::warn!("Looping without --loop-count or --realtime; stopping after one pass");
            Some(1)
        }
        None => None,
    };

    let interval = config.tick_interval_ms;
    let mut loops = 0;
    let mut ticks: u64 = 0;
    let state = loop {
        let report = player.tick(interval)?;
        ticks += 1;

        for event in player.drain_events() {
            if event == PlaybackEvent::Looped {
                loops += 1;
            }
            host::log_event(&event);
        }

        if report.finished {
            break player.automation_state();
        }
        if max_loops.is_some_and(|max| loops >= max) {
            let state = player.automation_state();
            player.stop();
            for event in player.drain_events() {
                host::log_event(&event);
            }
            break state;
        }
        if args.realtime {
            std::thread::sleep(Duration::from_secs_f64(interval / 1000.0));
        }
    };

    tracing::info!(
        "Finished after {} ticks, {} loops, {} actions completed",
        ticks,
        loops,
        state.executed_actions.len()
    );
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
