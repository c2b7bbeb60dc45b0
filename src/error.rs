//! Pipeline error taxonomy.
//!
//! Component plumbing (sources, backends, sinks, configuration) reports
//! failures as `anyhow::Error` with context. The stream driver maps those into
//! `PipelineError` at the component seams so callers can tell a fatal source
//! failure from a frame-scoped detector failure.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The video source could not be opened. Nothing else was started.
    #[error("video source unavailable: {source_name}")]
    SourceUnavailable {
        source_name: String,
        #[source]
        source: anyhow::Error,
    },

    /// A read yielded no data mid-stream. The driver treats this as end of stream.
    #[error("frame read failed after {frames_read} frames")]
    FrameReadFailure {
        frames_read: u64,
        #[source]
        source: anyhow::Error,
    },

    /// No detection capability is configured or it could not be built.
    /// Non-fatal: the pipeline degrades to pass-through annotation.
    #[error("detector unavailable: {reason}")]
    DetectorUnavailable { reason: String },

    /// The detector failed on a specific frame.
    #[error("detector inference failed on frame {frame_index}")]
    DetectorInference {
        frame_index: u64,
        #[source]
        source: anyhow::Error,
    },

    /// A display or recording sink failed to open, accept a frame, or close.
    #[error("sink '{sink}' failed")]
    Sink {
        sink: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The driver already reached its terminal state.
    #[error("pipeline is closed")]
    Closed,
}
