use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::FrameSink;
use crate::frame::{Frame, StreamInfo};

/// Writes each frame as `frame_000001.png`, `frame_000002.png`, ... into a directory.
pub struct ImageSequenceSink {
    dir: PathBuf,
    written: u64,
    open: bool,
}

impl ImageSequenceSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            written: 0,
            open: false,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.written
    }

    fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", index))
    }
}

impl FrameSink for ImageSequenceSink {
    fn name(&self) -> &'static str {
        "frames"
    }

    fn open(&mut self, info: &StreamInfo) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create output directory {}", self.dir.display()))?;
        log::info!(
            "recording {}x{} frames to {}",
            info.width,
            info.height,
            self.dir.display()
        );
        self.open = true;
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<()> {
        if !self.open {
            return Err(super::not_open(self.name()));
        }
        let path = self.frame_path(self.written + 1);
        frame
            .image()
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        self.written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.open {
            log::info!(
                "wrote {} frames to {}",
                self.written,
                self.dir.display()
            );
        }
        self.open = false;
        Ok(())
    }
}
