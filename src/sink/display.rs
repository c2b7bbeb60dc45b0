//! Live preview window backed by minifb.

use anyhow::{anyhow, Result};
use minifb::{Key, Window, WindowOptions};

use super::FrameSink;
use crate::cancel::CancellationToken;
use crate::frame::{Frame, StreamInfo};

pub struct WindowSink {
    title: String,
    cancel: CancellationToken,
    window: Option<Window>,
    buffer: Vec<u32>,
}

impl WindowSink {
    pub fn new(title: String, cancel: CancellationToken) -> Self {
        Self {
            title,
            cancel,
            window: None,
            buffer: Vec::new(),
        }
    }
}

impl FrameSink for WindowSink {
    fn name(&self) -> &'static str {
        "display"
    }

    fn open(&mut self, info: &StreamInfo) -> Result<()> {
        let mut window = Window::new(
            &self.title,
            info.width as usize,
            info.height as usize,
            WindowOptions::default(),
        )
        .map_err(|e| anyhow!("failed to create window: {}", e))?;
        window.set_target_fps((1000 / info.frame_interval_ms()).max(1) as usize);
        self.buffer = vec![0; info.width as usize * info.height as usize];
        self.window = Some(window);
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<()> {
        let window = self
            .window
            .as_mut()
            .ok_or_else(|| super::not_open("display"))?;

        // minifb wants 0RGB packed into u32.
        self.buffer.clear();
        self.buffer.extend(frame.image().pixels().map(|p| {
            let [r, g, b] = p.0;
            (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
        }));
        window
            .update_with_buffer(&self.buffer, frame.width() as usize, frame.height() as usize)
            .map_err(|e| anyhow!("window update failed: {}", e))?;

        if !window.is_open() || window.is_key_down(Key::Escape) || window.is_key_down(Key::Q) {
            log::info!("display closed by user");
            self.cancel.cancel();
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.window = None;
        Ok(())
    }
}
