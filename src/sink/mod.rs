//! Frame sinks: where annotated frames go.
//!
//! - `WindowSink`: live preview window (feature: display)
//! - `VideoRecorder`: MPEG-4 file (feature: record-ffmpeg)
//! - `ImageSequenceSink`: numbered PNG files
//!
//! Sinks are opened once the stream dimensions are known, receive every
//! annotated frame in order, and are closed exactly once by the driver.

#[cfg(feature = "display")]
pub mod display;
pub mod frames;
#[cfg(feature = "record-ffmpeg")]
pub mod recorder;

use anyhow::{anyhow, Result};

use crate::cancel::CancellationToken;
use crate::config::{AppConfig, RecordingFormat};
use crate::frame::{Frame, StreamInfo};

#[cfg(feature = "display")]
pub use display::WindowSink;
pub use frames::ImageSequenceSink;
#[cfg(feature = "record-ffmpeg")]
pub use recorder::VideoRecorder;

pub trait FrameSink {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Prepare for a stream with the given geometry.
    fn open(&mut self, _info: &StreamInfo) -> Result<()> {
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<()>;

    /// Flush and release. Called once, after the last `write`.
    fn close(&mut self) -> Result<()>;
}

/// Build the display and recording sinks selected by `config`.
///
/// The window sink trips `cancel` when the user closes it.
pub fn build_sinks(
    config: &AppConfig,
    cancel: &CancellationToken,
) -> Result<Vec<Box<dyn FrameSink>>> {
    let mut sinks: Vec<Box<dyn FrameSink>> = Vec::new();

    if config.display.enabled {
        #[cfg(feature = "display")]
        sinks.push(Box::new(WindowSink::new(
            config.display.title.clone(),
            cancel.clone(),
        )));
        #[cfg(not(feature = "display"))]
        {
            let _ = cancel;
            log::warn!("display requested but the display feature is not compiled in; running headless");
        }
    }

    if let Some(path) = &config.recording.path {
        match config.recording.format {
            RecordingFormat::Frames => sinks.push(Box::new(ImageSequenceSink::new(path))),
            RecordingFormat::Video => {
                #[cfg(feature = "record-ffmpeg")]
                sinks.push(Box::new(VideoRecorder::new(path)));
                #[cfg(not(feature = "record-ffmpeg"))]
                return Err(anyhow!(
                    "video recording requires the record-ffmpeg feature (use --record-format frames for PNG output)"
                ));
            }
        }
    }

    if sinks.is_empty() {
        log::info!("no display or recording configured; annotations are only logged");
    }
    Ok(sinks)
}

pub(crate) fn not_open(sink: &str) -> anyhow::Error {
    anyhow!("{} sink written before open", sink)
}
