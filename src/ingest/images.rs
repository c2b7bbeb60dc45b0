//! Directory of still images replayed as a video stream.
//!
//! Files are read in file-name order; anything the `image` crate cannot
//! decode by extension is skipped. Every image must match the size of the
//! first one.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

use super::FrameSource;
use crate::frame::{Frame, StreamInfo};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

pub struct ImageSequenceSource {
    dir: PathBuf,
    fps: f64,
    files: Vec<PathBuf>,
    cursor: usize,
    size: Option<(u32, u32)>,
    open: bool,
}

impl ImageSequenceSource {
    pub fn new(dir: impl AsRef<Path>, fps: f64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            fps,
            files: Vec::new(),
            cursor: 0,
            size: None,
            open: false,
        }
    }

    fn list_images(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read image directory {}", self.dir.display()))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && has_image_extension(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn load(path: &Path) -> Result<Frame> {
        let image = image::open(path)
            .with_context(|| format!("failed to decode {}", path.display()))?
            .to_rgb8();
        Frame::from_image(image)
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn open(&mut self) -> Result<StreamInfo> {
        let files = self.list_images()?;
        let first = files
            .first()
            .ok_or_else(|| anyhow!("no images found in {}", self.dir.display()))?;
        let first_image = Self::load(first)?;
        let (width, height) = (first_image.width(), first_image.height());

        log::info!(
            "ImageSequenceSource: {} images in {} ({}x{})",
            files.len(),
            self.dir.display(),
            width,
            height
        );
        self.files = files;
        self.cursor = 0;
        self.size = Some((width, height));
        self.open = true;
        Ok(StreamInfo {
            width,
            height,
            fps: self.fps,
            description: self.describe(),
        })
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        if !self.open {
            return Err(anyhow!("image source read before open"));
        }
        let Some(path) = self.files.get(self.cursor) else {
            return Ok(None);
        };
        let frame = Self::load(path)?;
        if let Some((width, height)) = self.size {
            if (frame.width(), frame.height()) != (width, height) {
                return Err(anyhow!(
                    "{} is {}x{}, stream is {}x{}",
                    path.display(),
                    frame.width(),
                    frame.height(),
                    width,
                    height
                ));
            }
        }
        self.cursor += 1;
        Ok(Some(frame))
    }

    fn release(&mut self) {
        if self.open {
            log::debug!("ImageSequenceSource: released {}", self.dir.display());
        }
        self.open = false;
        self.files.clear();
    }

    fn frames_read(&self) -> u64 {
        self.cursor as u64
    }
}
