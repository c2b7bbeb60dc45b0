//! tablewatch - annotate table occupancy on a video stream
//!
//! This binary:
//! 1. Resolves configuration (file, TABLEWATCH_* environment, flags)
//! 2. Opens the video source, detector backend, display and recorder
//! 3. Annotates every frame until the stream ends, the window is closed, or Ctrl-C
//! 4. Releases everything and reports how the run ended

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use table_watch::{
    AppConfig, CancellationToken, DetectorKind, Overrides, RecordingFormat, StreamDriver,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Video file, camera URL, image directory or stub://name?frames=N.
    source: Option<String>,
    /// TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Detector backend.
    #[arg(long, value_enum)]
    detector: Option<DetectorKind>,
    /// ONNX model for the tract backend.
    #[arg(long, value_name = "PATH")]
    model: Option<PathBuf>,
    /// JSON detections for the replay backend.
    #[arg(long, value_name = "PATH")]
    replay: Option<PathBuf>,
    /// Record annotated output to this file (video) or directory (frames).
    #[arg(long, value_name = "PATH")]
    record: Option<PathBuf>,
    /// Recording format.
    #[arg(long, value_enum)]
    record_format: Option<RecordingFormat>,
    /// Do not open a preview window.
    #[arg(long)]
    no_display: bool,
    /// TrueType font for labels and captions.
    #[arg(long, value_name = "PATH")]
    font: Option<PathBuf>,
    /// Class that marks a table occupied (repeatable: chair, person).
    #[arg(long = "seat-class", value_name = "CLASS")]
    seat_classes: Vec<String>,
    /// Stop after this many frames.
    #[arg(long, value_name = "N")]
    max_frames: Option<u64>,
    /// Print the run summary as JSON on stdout.
    #[arg(long)]
    summary_json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let overrides = Overrides {
        source: args.source,
        detector: args.detector,
        model: args.model,
        replay: args.replay,
        record: args.record,
        record_format: args.record_format,
        font: args.font,
        seat_classes: args.seat_classes,
        no_display: args.no_display,
    };
    let cfg = AppConfig::load(args.config.as_deref(), &overrides)?;
    log::info!(
        "tablewatch starting: source={} detector={:?} seats={:?}",
        cfg.source.path,
        cfg.detector.kind,
        cfg.occupancy.seat_classes
    );

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        log::info!("shutdown signal received, draining...");
        handler_token.cancel();
    })
    .context("error setting Ctrl-C handler")?;

    let mut driver = StreamDriver::from_config(&cfg, cancel)?.with_max_frames(args.max_frames);
    let summary = driver.run()?;

    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    log::info!(
        "tablewatch done: {} frames ({:?})",
        summary.frames,
        summary.stop_reason
    );
    Ok(())
}
