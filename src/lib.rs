//! Table occupancy watcher.
//!
//! Reads a video stream frame by frame, runs an object detector on each
//! frame, decides which tables are occupied (a chair, or optionally a person,
//! lying strictly inside a table box), draws boxes and captions onto the
//! frame, and hands it to a display window and/or recorder.
//!
//! # Module Structure
//!
//! - `frame`: Owned RGB frames and stream geometry
//! - `ingest`: Frame sources (synthetic, image directories, video files)
//! - `detect`: Detector backends and the adapter that normalizes their output
//! - `engine`: Occupancy decisions and overlay drawing
//! - `sink`: Display window and recorders
//! - `pipeline`: The stream driver tying the stages together
//! - `config`: TOML/env/CLI configuration
//! - `cancel`, `error`: Cancellation signal and pipeline error taxonomy

pub mod cancel;
pub mod config;
pub mod detect;
pub mod engine;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod pipeline;
pub mod sink;

pub use cancel::CancellationToken;
pub use config::{AppConfig, DetectorKind, DetectorSettings, Overrides, RecordingFormat};
pub use detect::{BBox, Detection, DetectionAdapter, DetectorBackend, RawDetection};
pub use engine::{Annotator, ClassStyle, ObjectClass, OccupancyReport, RenderStyle, TableStatus};
pub use error::PipelineError;
pub use frame::{Frame, StreamInfo};
pub use ingest::{FileConfig, FileSource, FrameSource};
pub use pipeline::{DriverState, RunSummary, StopReason, StreamDriver};
pub use sink::{FrameSink, ImageSequenceSink};
