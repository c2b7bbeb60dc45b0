//! Frames flowing through the pipeline.
//!
//! - `Frame`: an owned RGB image with positive dimensions. The stream driver
//!   owns each frame for one iteration; the engine draws on it in place.
//! - `StreamInfo`: what a source reports about the stream once opened.

use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};

/// Frame rate assumed when a source cannot report one.
pub const DEFAULT_FPS: f64 = 25.0;

/// One decoded video frame (height x width x 3 color samples).
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    /// Wrap an RGB image. Zero-sized images are rejected.
    pub fn from_image(image: RgbImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(anyhow!(
                "frame dimensions must be positive (got {}x{})",
                image.width(),
                image.height()
            ));
        }
        Ok(Self { image })
    }

    /// Build a frame from packed RGB24 bytes.
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        let image = RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| anyhow!("pixel buffer does not match {}x{}", width, height))?;
        Self::from_image(image)
    }

    /// A frame filled with one color.
    pub fn filled(width: u32, height: u32, color: Rgb<u8>) -> Result<Self> {
        Self::from_image(RgbImage::from_pixel(width, height, color))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    /// Packed RGB24 samples, row-major.
    pub fn as_rgb_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }
}

/// Properties a source reports once opened.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Human-readable source description for logs.
    pub description: String,
}

impl StreamInfo {
    /// Frame interval in milliseconds (at least 1).
    pub fn frame_interval_ms(&self) -> u64 {
        if self.fps <= 0.0 || !self.fps.is_finite() {
            return (1000.0 / DEFAULT_FPS) as u64;
        }
        ((1000.0 / self.fps).round() as u64).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_sized_frames() {
        assert!(Frame::from_image(RgbImage::new(0, 10)).is_err());
        assert!(Frame::from_image(RgbImage::new(10, 0)).is_err());
        assert!(Frame::from_image(RgbImage::new(1, 1)).is_ok());
    }

    #[test]
    fn from_rgb_checks_buffer_length() {
        assert!(Frame::from_rgb(4, 2, vec![0; 24]).is_ok());
        let err = Frame::from_rgb(4, 2, vec![0; 23]).unwrap_err();
        assert!(err.to_string().contains("expected 24 RGB bytes"));
    }

    #[test]
    fn frame_interval_falls_back_for_unknown_rate() {
        let mut info = StreamInfo {
            width: 640,
            height: 480,
            fps: 30.0,
            description: "test".into(),
        };
        assert_eq!(info.frame_interval_ms(), 33);
        info.fps = 0.0;
        assert_eq!(info.frame_interval_ms(), 40);
    }
}
