//! Path-addressed frame source.
//!
//! `FileSource` picks a backend from the configured path:
//! - `stub://<name>[?frames=N&width=W&height=H]`: synthetic frames
//! - an existing directory: still images replayed as a stream
//! - anything else: decoded with ffmpeg (feature: ingest-file-ffmpeg)

use anyhow::{anyhow, Context, Result};
use std::path::Path;

#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegFileSource;
use super::images::ImageSequenceSource;
use super::FrameSource;
use crate::frame::{Frame, StreamInfo};

const SYNTHETIC_WIDTH: u32 = 640;
const SYNTHETIC_HEIGHT: u32 = 480;

/// Configuration for a path-addressed source.
#[derive(Clone, Debug)]
pub struct FileConfig {
    /// Video path, image directory, camera URL or `stub://` address.
    pub path: String,
    /// Frame rate for sources that do not carry one (synthetic, image directories).
    pub fps: f64,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            fps: crate::frame::DEFAULT_FPS,
        }
    }
}

pub struct FileSource {
    backend: FileBackend,
}

enum FileBackend {
    Synthetic(SyntheticSource),
    Images(ImageSequenceSource),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegFileSource),
}

impl FileSource {
    pub fn new(config: FileConfig) -> Result<Self> {
        if config.path.trim().is_empty() {
            return Err(anyhow!("source path is empty"));
        }
        if config.path.starts_with("stub://") {
            return Ok(Self {
                backend: FileBackend::Synthetic(SyntheticSource::parse(&config)?),
            });
        }
        if Path::new(&config.path).is_dir() {
            return Ok(Self {
                backend: FileBackend::Images(ImageSequenceSource::new(&config.path, config.fps)),
            });
        }
        #[cfg(feature = "ingest-file-ffmpeg")]
        {
            Ok(Self {
                backend: FileBackend::Ffmpeg(FfmpegFileSource::new(config)),
            })
        }
        #[cfg(not(feature = "ingest-file-ffmpeg"))]
        {
            Err(anyhow!(
                "video file ingestion requires the ingest-file-ffmpeg feature ({})",
                config.path
            ))
        }
    }
}

impl FrameSource for FileSource {
    fn describe(&self) -> String {
        match &self.backend {
            FileBackend::Synthetic(source) => source.path.clone(),
            FileBackend::Images(source) => source.describe(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.describe(),
        }
    }

    fn open(&mut self) -> Result<StreamInfo> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.open(),
            FileBackend::Images(source) => source.open(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.open(),
        }
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.read_frame(),
            FileBackend::Images(source) => source.read_frame(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.read_frame(),
        }
    }

    fn release(&mut self) {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.release(),
            FileBackend::Images(source) => source.release(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.release(),
        }
    }

    fn frames_read(&self) -> u64 {
        match &self.backend {
            FileBackend::Synthetic(source) => source.frame_count,
            FileBackend::Images(source) => source.frames_read(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.frames_read(),
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests and demos
// ----------------------------------------------------------------------------

struct SyntheticSource {
    path: String,
    fps: f64,
    width: u32,
    height: u32,
    /// `None` streams forever.
    limit: Option<u64>,
    frame_count: u64,
    open: bool,
}

impl SyntheticSource {
    fn parse(config: &FileConfig) -> Result<Self> {
        let mut source = Self {
            path: config.path.clone(),
            fps: config.fps,
            width: SYNTHETIC_WIDTH,
            height: SYNTHETIC_HEIGHT,
            limit: None,
            frame_count: 0,
            open: false,
        };
        let Some((_, query)) = config.path.split_once('?') else {
            return Ok(source);
        };
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("malformed stub parameter '{}'", pair))?;
            let parsed: u64 = value
                .parse()
                .with_context(|| format!("stub parameter {} must be an integer", key))?;
            match key {
                "frames" => source.limit = Some(parsed),
                "width" => source.width = u32::try_from(parsed)?,
                "height" => source.height = u32::try_from(parsed)?,
                other => return Err(anyhow!("unknown stub parameter '{}'", other)),
            }
        }
        if source.width == 0 || source.height == 0 {
            return Err(anyhow!("stub frame dimensions must be positive"));
        }
        Ok(source)
    }

    fn open(&mut self) -> Result<StreamInfo> {
        self.open = true;
        log::info!("FileSource: connected to {} (synthetic)", self.path);
        Ok(StreamInfo {
            width: self.width,
            height: self.height,
            fps: self.fps,
            description: self.path.clone(),
        })
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        if !self.open {
            return Err(anyhow!("synthetic source read before open"));
        }
        if self.limit.is_some_and(|limit| self.frame_count >= limit) {
            return Ok(None);
        }
        self.frame_count += 1;
        let pixels = self.generate_synthetic_pixels();
        Frame::from_rgb(self.width, self.height, pixels).map(Some)
    }

    fn generate_synthetic_pixels(&self) -> Vec<u8> {
        let pixel_count = (self.width as usize) * (self.height as usize) * 3;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 / 3 + self.frame_count) % 256) as u8;
        }
        pixels
    }

    fn release(&mut self) {
        if self.open {
            log::debug!("FileSource: released {}", self.path);
        }
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub(path: &str) -> FileSource {
        FileSource::new(FileConfig {
            path: path.to_string(),
            fps: 10.0,
        })
        .unwrap()
    }

    #[test]
    fn stub_source_honours_frame_limit_and_size() {
        let mut source = stub("stub://desk?frames=3&width=32&height=16");
        let info = source.open().unwrap();
        assert_eq!((info.width, info.height), (32, 16));
        assert_eq!(info.fps, 10.0);

        let mut count = 0;
        while let Some(frame) = source.read_frame().unwrap() {
            assert_eq!((frame.width(), frame.height()), (32, 16));
            count += 1;
        }
        assert_eq!(count, 3);
        assert_eq!(source.frames_read(), 3);
        source.release();
        source.release();
    }

    #[test]
    fn stub_without_limit_keeps_streaming() {
        let mut source = stub("stub://live");
        source.open().unwrap();
        for _ in 0..5 {
            assert!(source.read_frame().unwrap().is_some());
        }
    }

    #[test]
    fn stub_frames_change_over_time() {
        let mut source = stub("stub://desk?width=4&height=4");
        source.open().unwrap();
        let a = source.read_frame().unwrap().unwrap();
        let b = source.read_frame().unwrap().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_bad_stub_parameters() {
        for path in ["stub://x?frames=abc", "stub://x?speed=2", "stub://x?width=0"] {
            assert!(
                FileSource::new(FileConfig {
                    path: path.into(),
                    fps: 10.0
                })
                .is_err(),
                "{}",
                path
            );
        }
    }

    #[test]
    fn rejects_empty_path() {
        assert!(FileSource::new(FileConfig::default()).is_err());
    }
}
