//! Stream driver: source → detector → annotator → sinks, one frame at a time.
//!
//! Lifecycle: `Idle → Opening → Running → Draining → Closed`.
//! - A source that fails to open ends the run before anything else starts.
//! - Every frame read is annotated and delivered to every sink before the next
//!   read; nothing is dropped or reordered.
//! - Draining always runs once the source is open: the source is released and
//!   every opened sink is closed, whatever ended the run.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::cancel::CancellationToken;
use crate::config::AppConfig;
use crate::detect::DetectionAdapter;
use crate::engine::{Annotator, ClassStyle, OccupancyReport, TextRenderer};
use crate::error::PipelineError;
use crate::ingest::{FileConfig, FileSource, FrameSource};
use crate::sink::{build_sinks, FrameSink};

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Opening,
    Running,
    Draining,
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The source reported no more frames.
    EndOfStream,
    /// The cancellation token was tripped or the frame cap was reached.
    Cancelled,
    /// A read failed mid-stream; treated as end of stream.
    ReadFailure,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    /// Frames annotated and delivered to every sink.
    pub frames: u64,
    pub stop_reason: StopReason,
    /// Occupancy of the last annotated frame.
    pub last_report: Option<OccupancyReport>,
}

pub struct StreamDriver {
    source: Box<dyn FrameSource>,
    adapter: DetectionAdapter,
    annotator: Annotator,
    sinks: Vec<Box<dyn FrameSink>>,
    cancel: CancellationToken,
    max_frames: Option<u64>,
    state: DriverState,
    source_open: bool,
    opened_sinks: usize,
}

impl StreamDriver {
    pub fn new(
        source: Box<dyn FrameSource>,
        adapter: DetectionAdapter,
        annotator: Annotator,
        sinks: Vec<Box<dyn FrameSink>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            adapter,
            annotator,
            sinks,
            cancel,
            max_frames: None,
            state: DriverState::Idle,
            source_open: false,
            opened_sinks: 0,
        }
    }

    /// Assemble source, detector, annotator and sinks from resolved configuration.
    ///
    /// An unusable detector degrades to pass-through; an unusable source or sink
    /// is an error.
    pub fn from_config(
        config: &AppConfig,
        cancel: CancellationToken,
    ) -> Result<Self, PipelineError> {
        let source = FileSource::new(FileConfig {
            path: config.source.path.clone(),
            fps: config.source.fps,
        })
        .map_err(|source| PipelineError::SourceUnavailable {
            source_name: config.source.path.clone(),
            source,
        })?;

        let adapter = DetectionAdapter::from_settings(&config.detector);

        let text = match &config.render.font_path {
            Some(path) => TextRenderer::from_path(path).unwrap_or_else(|e| {
                log::warn!("{:#}", e);
                TextRenderer::system()
            }),
            None => TextRenderer::system(),
        };
        let annotator = Annotator::new(
            ClassStyle::default(),
            config.render.style.clone(),
            config.occupancy.seat_classes.clone(),
            text,
        );

        let sinks = build_sinks(config, &cancel).map_err(|source| PipelineError::Sink {
            sink: "setup",
            source,
        })?;

        Ok(Self::new(Box::new(source), adapter, annotator, sinks, cancel))
    }

    /// Stop after `limit` frames, reported as `Cancelled`.
    pub fn with_max_frames(mut self, limit: Option<u64>) -> Self {
        self.max_frames = limit;
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Process the stream until it ends, is cancelled, or fails.
    ///
    /// A driver runs once; calling `run` again returns `PipelineError::Closed`.
    pub fn run(&mut self) -> Result<RunSummary, PipelineError> {
        if self.state != DriverState::Idle {
            return Err(PipelineError::Closed);
        }

        self.state = DriverState::Opening;
        if let Err(e) = self.open() {
            if let Err(close) = self.drain() {
                log::error!("{:#}", anyhow::Error::from(close));
            }
            return Err(e);
        }

        self.state = DriverState::Running;
        let outcome = self.process();

        let close_result = self.drain();
        let summary = outcome?;
        close_result?;
        log::info!(
            "stream finished: frames={} reason={:?}",
            summary.frames,
            summary.stop_reason
        );
        Ok(summary)
    }

    fn open(&mut self) -> Result<(), PipelineError> {
        let source_name = self.source.describe();
        let info = self
            .source
            .open()
            .map_err(|source| PipelineError::SourceUnavailable {
                source_name: source_name.clone(),
                source,
            })?;
        self.source_open = true;
        log::info!(
            "source {} opened: {}x{} @ {:.2} fps",
            source_name,
            info.width,
            info.height,
            info.fps
        );

        for sink in self.sinks.iter_mut() {
            sink.open(&info).map_err(|source| PipelineError::Sink {
                sink: sink.name(),
                source,
            })?;
            self.opened_sinks += 1;
        }

        if self.adapter.is_enabled() {
            if let Err(e) = self.adapter.warm_up() {
                log::warn!("{}; continuing without detections", e);
            }
        } else {
            log::info!("no detector configured; frames pass through unannotated");
        }
        Ok(())
    }

    fn process(&mut self) -> Result<RunSummary, PipelineError> {
        let mut frames: u64 = 0;
        let mut last_report: Option<OccupancyReport> = None;
        let mut last_health_log = Instant::now();

        let stop_reason = loop {
            if self.cancel.is_cancelled() {
                log::info!("cancellation requested after {} frames", frames);
                break StopReason::Cancelled;
            }
            if self.max_frames.is_some_and(|limit| frames >= limit) {
                log::info!("frame limit reached ({})", frames);
                break StopReason::Cancelled;
            }

            let mut frame = match self.source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break StopReason::EndOfStream,
                Err(source) => {
                    let err = PipelineError::FrameReadFailure {
                        frames_read: self.source.frames_read(),
                        source,
                    };
                    log::warn!("{:#}; ending stream", anyhow::Error::from(err));
                    break StopReason::ReadFailure;
                }
            };

            let detections = self.adapter.run(&frame, frames)?;
            let report = self.annotator.annotate(&mut frame, &detections);

            for sink in self.sinks.iter_mut() {
                sink.write(&frame).map_err(|source| PipelineError::Sink {
                    sink: sink.name(),
                    source,
                })?;
            }
            frames += 1;

            log::debug!("frame {}: {}", frames, report.summary());
            if last_report.as_ref() != Some(&report) {
                log::info!("occupancy: {}", report.summary());
            }
            last_report = Some(report);

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                log::info!(
                    "pipeline health frames={} read={} detector={} source={}",
                    frames,
                    self.source.frames_read(),
                    self.adapter.backend_name().unwrap_or("none"),
                    self.source.describe()
                );
                last_health_log = Instant::now();
            }
        };

        Ok(RunSummary {
            frames,
            stop_reason,
            last_report,
        })
    }

    /// Release the source and close every opened sink. Returns the first close error.
    fn drain(&mut self) -> Result<(), PipelineError> {
        self.state = DriverState::Draining;
        if self.source_open {
            self.source.release();
            self.source_open = false;
        }

        let mut first_error = None;
        for sink in self.sinks.iter_mut().take(self.opened_sinks) {
            if let Err(source) = sink.close() {
                log::error!("failed to close sink {}: {:#}", sink.name(), source);
                if first_error.is_none() {
                    first_error = Some(PipelineError::Sink {
                        sink: sink.name(),
                        source,
                    });
                }
            }
        }
        self.opened_sinks = 0;
        self.state = DriverState::Closed;
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for StreamDriver {
    fn drop(&mut self) {
        if self.source_open || self.opened_sinks > 0 {
            let _ = self.drain();
        }
    }
}
