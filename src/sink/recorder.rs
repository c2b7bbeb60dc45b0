//! MPEG-4 recorder using FFmpeg.
//!
//! Frames are converted from RGB24 to YUV420P and encoded at the source's
//! dimensions and frame rate. The container is picked from the file extension
//! (`.mp4` in practice).

use anyhow::{anyhow, Context, Result};
use ffmpeg_next as ffmpeg;
use std::path::{Path, PathBuf};

use super::FrameSink;
use crate::frame::{Frame, StreamInfo};

struct Encoding {
    output: ffmpeg::format::context::Output,
    encoder: ffmpeg::encoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    stream_index: usize,
    encoder_time_base: ffmpeg::Rational,
    stream_time_base: ffmpeg::Rational,
    width: u32,
    height: u32,
    next_pts: i64,
}

pub struct VideoRecorder {
    path: PathBuf,
    state: Option<Encoding>,
}

impl VideoRecorder {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: None,
        }
    }
}

impl FrameSink for VideoRecorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    fn open(&mut self, info: &StreamInfo) -> Result<()> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let mut output = ffmpeg::format::output(&self.path)
            .with_context(|| format!("failed to create output {}", self.path.display()))?;
        let codec = ffmpeg::encoder::find(ffmpeg::codec::Id::MPEG4)
            .ok_or_else(|| anyhow!("MPEG-4 encoder not available in this ffmpeg build"))?;
        let global_header = output
            .format()
            .flags()
            .contains(ffmpeg::format::Flags::GLOBAL_HEADER);

        let mut stream = output.add_stream(codec).context("add video stream")?;
        let stream_index = stream.index();

        let mut encoder = ffmpeg::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .context("create video encoder")?;
        let frame_rate = ffmpeg::Rational::from(info.fps);
        encoder.set_width(info.width);
        encoder.set_height(info.height);
        encoder.set_format(ffmpeg::format::Pixel::YUV420P);
        encoder.set_frame_rate(Some(frame_rate));
        encoder.set_time_base(frame_rate.invert());
        if global_header {
            encoder.set_flags(ffmpeg::codec::Flags::GLOBAL_HEADER);
        }
        let encoder = encoder.open_as(codec).context("open MPEG-4 encoder")?;
        stream.set_parameters(&encoder);
        stream.set_time_base(frame_rate.invert());

        output.write_header().context("write container header")?;
        let stream_time_base = output
            .stream(stream_index)
            .map(|s| s.time_base())
            .ok_or_else(|| anyhow!("output stream disappeared"))?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            ffmpeg::format::Pixel::RGB24,
            info.width,
            info.height,
            ffmpeg::format::Pixel::YUV420P,
            info.width,
            info.height,
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        log::info!(
            "recording {}x{} @ {:.2} fps to {}",
            info.width,
            info.height,
            info.fps,
            self.path.display()
        );
        self.state = Some(Encoding {
            output,
            encoder,
            scaler,
            stream_index,
            encoder_time_base: frame_rate.invert(),
            stream_time_base,
            width: info.width,
            height: info.height,
            next_pts: 0,
        });
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<()> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| super::not_open("recorder"))?;
        if (frame.width(), frame.height()) != (state.width, state.height) {
            return Err(anyhow!(
                "frame is {}x{}, recording is {}x{}",
                frame.width(),
                frame.height(),
                state.width,
                state.height
            ));
        }

        let mut rgb = ffmpeg::frame::Video::new(
            ffmpeg::format::Pixel::RGB24,
            state.width,
            state.height,
        );
        copy_rows(frame, &mut rgb);

        let mut yuv = ffmpeg::frame::Video::empty();
        state
            .scaler
            .run(&rgb, &mut yuv)
            .context("convert frame to YUV420P")?;
        yuv.set_pts(Some(state.next_pts));
        state.next_pts += 1;

        state
            .encoder
            .send_frame(&yuv)
            .context("send frame to encoder")?;
        state.drain_packets()
    }

    fn close(&mut self) -> Result<()> {
        let Some(mut state) = self.state.take() else {
            return Ok(());
        };
        state.encoder.send_eof().context("flush encoder")?;
        state.drain_packets()?;
        state
            .output
            .write_trailer()
            .context("write container trailer")?;
        log::info!(
            "recorded {} frames to {}",
            state.next_pts,
            self.path.display()
        );
        Ok(())
    }
}

impl Encoding {
    fn drain_packets(&mut self) -> Result<()> {
        let mut packet = ffmpeg::Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet
                .write_interleaved(&mut self.output)
                .context("write packet")?;
        }
        Ok(())
    }
}

fn copy_rows(frame: &Frame, target: &mut ffmpeg::frame::Video) {
    let row_bytes = frame.width() as usize * 3;
    let stride = target.stride(0);
    let data = target.data_mut(0);
    for (row, src) in frame.as_rgb_bytes().chunks_exact(row_bytes).enumerate() {
        let start = row * stride;
        data[start..start + row_bytes].copy_from_slice(src);
    }
}
