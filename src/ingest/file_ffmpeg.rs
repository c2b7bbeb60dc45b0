//! Local file and camera URL source using FFmpeg.
//!
//! Decoding happens in-memory; frames are converted to packed RGB24. At end
//! of input the decoder is drained so trailing frames are not lost.

use anyhow::{anyhow, Context, Result};
use ffmpeg_next as ffmpeg;

use super::file::FileConfig;
use crate::frame::{Frame, StreamInfo};

struct Decoding {
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    eof_sent: bool,
}

pub(crate) struct FfmpegFileSource {
    config: FileConfig,
    state: Option<Decoding>,
    frame_count: u64,
}

impl FfmpegFileSource {
    pub(crate) fn new(config: FileConfig) -> Self {
        Self {
            config,
            state: None,
            frame_count: 0,
        }
    }

    pub(crate) fn describe(&self) -> String {
        self.config.path.clone()
    }

    pub(crate) fn open(&mut self) -> Result<StreamInfo> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let input = ffmpeg::format::input(&self.config.path)
            .with_context(|| format!("failed to open input '{}' with ffmpeg", self.config.path))?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow!("input has no video track"))?;
        let stream_index = input_stream.index();
        let rate = input_stream.avg_frame_rate();
        let fps = if rate.denominator() != 0 && rate.numerator() > 0 {
            f64::from(rate)
        } else {
            self.config.fps
        };
        let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())
            .context("load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("open ffmpeg video decoder")?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        let info = StreamInfo {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            description: self.config.path.clone(),
        };
        log::info!(
            "FileSource: connected to {} (ffmpeg, {}x{} @ {:.2} fps)",
            self.config.path,
            info.width,
            info.height,
            info.fps
        );
        self.state = Some(Decoding {
            input,
            stream_index,
            decoder,
            scaler,
            eof_sent: false,
        });
        Ok(info)
    }

    pub(crate) fn read_frame(&mut self) -> Result<Option<Frame>> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| anyhow!("ffmpeg source read before open"))?;
        let mut decoded = ffmpeg::frame::Video::empty();

        loop {
            if state.decoder.receive_frame(&mut decoded).is_ok() {
                let frame = state.convert(&decoded)?;
                self.frame_count += 1;
                return Ok(Some(frame));
            }
            if state.eof_sent {
                return Ok(None);
            }
            match state.input.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != state.stream_index {
                        continue;
                    }
                    state
                        .decoder
                        .send_packet(&packet)
                        .context("send packet to ffmpeg decoder")?;
                }
                None => {
                    state.decoder.send_eof().context("flush ffmpeg decoder")?;
                    state.eof_sent = true;
                }
            }
        }
    }

    pub(crate) fn release(&mut self) {
        if self.state.take().is_some() {
            log::debug!("FileSource: released {}", self.config.path);
        }
    }

    pub(crate) fn frames_read(&self) -> u64 {
        self.frame_count
    }
}

impl Decoding {
    fn convert(&mut self, decoded: &ffmpeg::frame::Video) -> Result<Frame> {
        let mut rgb_frame = ffmpeg::frame::Video::empty();
        self.scaler
            .run(decoded, &mut rgb_frame)
            .context("scale frame to RGB")?;
        let (pixels, width, height) = frame_to_pixels(&rgb_frame)?;
        Frame::from_rgb(width, height, pixels)
    }
}

fn frame_to_pixels(frame: &ffmpeg::frame::Video) -> Result<(Vec<u8>, u32, u32)> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = (width as usize) * 3;
    let stride = frame.stride(0);
    let data = frame.data(0);

    if stride == row_bytes {
        let len = row_bytes * height as usize;
        let pixels = data
            .get(..len)
            .context("ffmpeg frame is shorter than expected")?;
        return Ok((pixels.to_vec(), width, height));
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .context("ffmpeg frame row is out of bounds")?,
        );
    }

    Ok((pixels, width, height))
}
