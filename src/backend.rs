//! The media toolkit seam.
//!
//! The pipeline never talks to FFmpeg directly. It needs two things from a
//! media toolkit: cut a time range out of a video into a new file, and walk
//! the frames of that file in presentation order. [`MediaBackend`] captures
//! exactly that, and [`FfmpegBackend`] implements it with `ffmpeg-next`.

use std::path::Path;
use std::time::Duration;

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    format::Pixel,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbaImage;

use crate::clip::ClipExtractor;
use crate::error::SubgifError;
use crate::sampling::FrameSampler;
use crate::timestamp::TimeRange;
use crate::utilities::{frame_to_buffer, pts_to_duration};

const MAX_CONSECUTIVE_READ_ERRORS: u32 = 32;

/// Callback receiving each sampled frame with its presentation timestamp.
pub type FrameVisitor<'a> = dyn FnMut(Duration, RgbaImage) -> Result<(), SubgifError> + 'a;

/// Video operations the pipeline depends on.
pub trait MediaBackend {
    /// Cut `range` out of `source` into `destination` and return the number
    /// of frames written.
    ///
    /// # Errors
    ///
    /// Must return [`SubgifError::ClipExtractionError`] when the source is
    /// unreadable, the range is invalid or the destination is unwritable.
    fn extract_clip(
        &mut self,
        source: &Path,
        range: &TimeRange,
        destination: &Path,
    ) -> Result<u64, SubgifError>;

    /// Decode `clip` in presentation order, offer each frame's timestamp to
    /// `sampler` and hand accepted frames to `visit`. Stops early once the
    /// sampler is exhausted or `visit` fails.
    fn decode_frames(
        &mut self,
        clip: &Path,
        sampler: &mut FrameSampler,
        visit: &mut FrameVisitor<'_>,
    ) -> Result<(), SubgifError>;
}

/// [`MediaBackend`] built on FFmpeg. Stateless; every call opens its own
/// demuxer, decoder and encoder, so clones can run on separate threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegBackend;

impl FfmpegBackend {
    /// Create the backend, initialising FFmpeg if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SubgifError::FfmpegError`] if FFmpeg cannot be initialised.
    pub fn new() -> Result<Self, SubgifError> {
        crate::ffmpeg::ensure_initialized()?;
        Ok(Self)
    }
}

impl MediaBackend for FfmpegBackend {
    fn extract_clip(
        &mut self,
        source: &Path,
        range: &TimeRange,
        destination: &Path,
    ) -> Result<u64, SubgifError> {
        ClipExtractor::new(source, *range).run(destination)
    }

    fn decode_frames(
        &mut self,
        clip: &Path,
        sampler: &mut FrameSampler,
        visit: &mut FrameVisitor<'_>,
    ) -> Result<(), SubgifError> {
        crate::ffmpeg::ensure_initialized()?;
        let mut input = ffmpeg_next::format::input(&clip).map_err(|error| {
            SubgifError::FfmpegError(format!("cannot open clip {}: {error}", clip.display()))
        })?;

        let (stream_index, time_base, mut decoder) = {
            let stream = input.streams().best(Type::Video).ok_or_else(|| {
                SubgifError::FfmpegError(format!("clip {} has no video stream", clip.display()))
            })?;
            let decoder = CodecContext::from_parameters(stream.parameters())?
                .decoder()
                .video()?;
            (stream.index(), stream.time_base(), decoder)
        };

        let width = decoder.width();
        let height = decoder.height();
        let mut scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGBA,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        let mut decoded = VideoFrame::empty();
        let mut scaled = VideoFrame::empty();
        let mut eof_sent = false;
        let mut read_errors = 0u32;

        loop {
            while decoder.receive_frame(&mut decoded).is_ok() {
                let pts = decoded.timestamp().or_else(|| decoded.pts()).unwrap_or(0);
                let timestamp = pts_to_duration(pts, time_base);
                if !sampler.accept(timestamp) {
                    continue;
                }

                scaler.run(&decoded, &mut scaled)?;
                let buffer = frame_to_buffer(&scaled, width, height, 4);
                let image = RgbaImage::from_raw(width, height, buffer).ok_or_else(|| {
                    SubgifError::FfmpegError(
                        "decoded frame does not fill an RGBA buffer".to_string(),
                    )
                })?;
                visit(timestamp, image)?;

                if sampler.is_exhausted() {
                    return Ok(());
                }
            }

            if eof_sent {
                return Ok(());
            }

            let mut packet = Packet::empty();
            match packet.read(&mut input) {
                Ok(()) => {
                    read_errors = 0;
                    if packet.stream() == stream_index {
                        decoder.send_packet(&packet)?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    decoder.send_eof()?;
                    eof_sent = true;
                }
                Err(error) if read_errors < MAX_CONSECUTIVE_READ_ERRORS => {
                    read_errors += 1;
                    log::debug!("Ignoring read error in {}: {error}", clip.display());
                }
                Err(error) => return Err(error.into()),
            }
        }
    }
}
