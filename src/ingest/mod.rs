//! Frame ingestion sources.
//!
//! This module provides different sources of frames:
//! - Synthetic `stub://` streams (testing, demos)
//! - Directories of still images replayed in file-name order
//! - Local video files and camera URLs (feature: ingest-file-ffmpeg)
//!
//! Every source follows the same lifecycle: `open` once (reporting stream
//! dimensions and frame rate), `read_frame` until it returns `None`, then
//! `release`. `release` must be safe to call more than once.

pub mod file;
#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;
pub mod images;

use anyhow::Result;

use crate::frame::{Frame, StreamInfo};

pub use file::{FileConfig, FileSource};
pub use images::ImageSequenceSource;

/// A finite or live sequence of frames.
pub trait FrameSource {
    /// Description for logs (path or URL).
    fn describe(&self) -> String;

    /// Acquire the underlying stream.
    fn open(&mut self) -> Result<StreamInfo>;

    /// Next frame, or `None` at end of stream.
    fn read_frame(&mut self) -> Result<Option<Frame>>;

    /// Release the underlying stream. Idempotent.
    fn release(&mut self);

    /// Frames delivered so far.
    fn frames_read(&self) -> u64;
}
