//! Cutting a cue's time range out of the source video.
//!
//! [`ClipExtractor`] decodes the source's best video stream from the nearest
//! keyframe before the cue start, drops frames before the start, stops at the
//! end, and re-encodes what is left as H.264 (YUV 4:2:0) into a new file.
//! Builds of FFmpeg without an H.264 encoder fall back to MPEG-4 Part 2.
//! Audio is not carried over.
//!
//! # Example
//!
//! ```no_run
//! use subgif::clip::ClipExtractor;
//! use subgif::timestamp::parse_time_range;
//!
//! let range = parse_time_range("00:00:01,000 --> 00:00:02,500").unwrap();
//! let frames = ClipExtractor::new("input.mp4", range).run("screenshots/clip.mp4")?;
//! println!("clip holds {frames} frames");
//! # Ok::<(), subgif::SubgifError>(())
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use ffmpeg_next::codec::Id;
use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::codec::encoder::video::Encoder as VideoEncoder;
use ffmpeg_next::decoder::Video as VideoDecoder;
use ffmpeg_next::format::context::Output;
use ffmpeg_next::format::{Flags as FormatFlags, Pixel};
use ffmpeg_next::frame::Video as VideoFrame;
use ffmpeg_next::media::Type;
use ffmpeg_next::software::scaling::{Context as ScalingContext, Flags as ScalingFlags};
use ffmpeg_next::{Packet, Rational};

use crate::error::SubgifError;
use crate::timestamp::TimeRange;
use crate::utilities::{duration_to_seek_timestamp, even_dimension, pts_to_duration};

/// Frame rate assumed when the source does not report one.
const FALLBACK_FRAME_RATE: Rational = Rational(25, 1);

/// Re-encodes one time range of a video into its own file.
#[derive(Debug, Clone)]
pub struct ClipExtractor {
    source: PathBuf,
    range: TimeRange,
}

impl ClipExtractor {
    /// Prepare an extraction of `range` from `source`.
    pub fn new<P: AsRef<Path>>(source: P, range: TimeRange) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            range,
        }
    }

    /// Write the clip to `destination`, replacing any existing file, and
    /// return the number of frames written. The container is chosen from
    /// the destination's extension.
    ///
    /// A range that ends past the end of the source is clamped to the
    /// source's end. A clip may legitimately hold zero frames (for example a
    /// range between two keyframes of a sparse stream); callers decide
    /// whether that is an error.
    ///
    /// # Errors
    ///
    /// Returns [`SubgifError::ClipExtractionError`] if the range is empty or
    /// reversed, starts after the source ends, the source cannot be opened
    /// or decoded, or the destination cannot be written.
    pub fn run<P: AsRef<Path>>(&self, destination: P) -> Result<u64, SubgifError> {
        let destination = destination.as_ref();
        log::debug!(
            "Extracting {} --> {} from {} into {}",
            self.range.start,
            self.range.end,
            self.source.display(),
            destination.display(),
        );

        if !self.range.is_ordered() {
            return Err(self.error("end must come after start"));
        }

        crate::ffmpeg::ensure_initialized().map_err(|error| self.error(error))?;

        let mut input = ffmpeg_next::format::input(&self.source)
            .map_err(|error| self.error(format!("cannot open {}: {error}", self.source.display())))?;

        let start = self.range.start.as_duration();
        let mut end = self.range.end.as_duration();

        let duration_microseconds = input.duration();
        if duration_microseconds > 0 {
            let source_duration = Duration::from_micros(duration_microseconds as u64);
            if start >= source_duration {
                return Err(self.error(format!(
                    "range starts after the source ends ({source_duration:?})"
                )));
            }
            if end > source_duration {
                log::warn!(
                    "Clamping cue end {} to source duration {source_duration:?}",
                    self.range.end
                );
                end = source_duration;
            }
        }

        let (stream_index, time_base, frame_rate, mut decoder) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or_else(|| self.error("source has no video stream"))?;
            let frame_rate = usable_rate(stream.avg_frame_rate())
                .or_else(|| usable_rate(stream.rate()))
                .unwrap_or(FALLBACK_FRAME_RATE);
            let decoder = CodecContext::from_parameters(stream.parameters())
                .and_then(|context| context.decoder().video())
                .map_err(|error| self.error(format!("cannot open decoder: {error}")))?;
            (stream.index(), stream.time_base(), frame_rate, decoder)
        };

        let seek_timestamp = duration_to_seek_timestamp(start);
        if let Err(error) = input.seek(seek_timestamp, ..seek_timestamp) {
            log::debug!("Seek to {} failed ({error}); decoding from the start", self.range.start);
        }

        let mut writer = ClipWriter::create(destination, &decoder, frame_rate)
            .map_err(|reason| self.error(reason))?;

        let mut decoded = VideoFrame::empty();
        let mut reached_end = false;

        for (stream, packet) in input.packets() {
            if stream.index() != stream_index {
                continue;
            }
            if let Err(error) = decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet: {error}");
                continue;
            }
            if drain_decoder(&mut decoder, &mut decoded, &mut writer, time_base, start, end)
                .map_err(|reason| self.error(reason))?
            {
                reached_end = true;
                break;
            }
        }

        if !reached_end {
            decoder
                .send_eof()
                .map_err(|error| self.error(format!("decoder flush failed: {error}")))?;
            drain_decoder(&mut decoder, &mut decoded, &mut writer, time_base, start, end)
                .map_err(|reason| self.error(reason))?;
        }

        let frames = writer.finish().map_err(|reason| self.error(reason))?;
        log::debug!("Clip {} holds {frames} frames", destination.display());
        Ok(frames)
    }

    fn error(&self, reason: impl ToString) -> SubgifError {
        SubgifError::ClipExtractionError {
            start: self.range.start.to_string(),
            end: self.range.end.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn usable_rate(rate: Rational) -> Option<Rational> {
    (rate.numerator() > 0 && rate.denominator() > 0).then_some(rate)
}

/// Feed every frame the decoder has ready into the writer. Returns `true`
/// once a frame at or past `end` shows up.
fn drain_decoder(
    decoder: &mut VideoDecoder,
    decoded: &mut VideoFrame,
    writer: &mut ClipWriter,
    time_base: Rational,
    start: Duration,
    end: Duration,
) -> Result<bool, String> {
    while decoder.receive_frame(decoded).is_ok() {
        let pts = decoded.timestamp().or_else(|| decoded.pts()).unwrap_or(0);
        let timestamp = pts_to_duration(pts, time_base);
        if timestamp < start {
            continue;
        }
        if timestamp >= end {
            return Ok(true);
        }
        writer.write(decoded)?;
    }
    Ok(false)
}

/// Encoder, scaler and muxer for one output clip.
struct ClipWriter {
    output: Output,
    encoder: VideoEncoder,
    scaler: ScalingContext,
    stream_index: usize,
    encoder_time_base: Rational,
    next_pts: i64,
}

impl ClipWriter {
    fn create(
        destination: &Path,
        decoder: &VideoDecoder,
        frame_rate: Rational,
    ) -> Result<Self, String> {
        let width = even_dimension(decoder.width());
        let height = even_dimension(decoder.height());
        let encoder_time_base = Rational::new(frame_rate.denominator(), frame_rate.numerator());

        let mut output = ffmpeg_next::format::output(&destination)
            .map_err(|error| format!("cannot create {}: {error}", destination.display()))?;
        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(Id::H264)
            .or_else(|| {
                log::debug!("No H.264 encoder available, falling back to MPEG-4");
                ffmpeg_next::encoder::find(Id::MPEG4)
            })
            .ok_or_else(|| "no H.264 or MPEG-4 encoder available".to_string())?;

        let mut stream = output
            .add_stream(codec)
            .map_err(|error| format!("cannot add output stream: {error}"))?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.encoder().video())
            .map_err(|error| format!("cannot create encoder context: {error}"))?;

        encoder.set_width(width);
        encoder.set_height(height);
        encoder.set_format(Pixel::YUV420P);
        encoder.set_time_base(encoder_time_base);
        encoder.set_frame_rate(Some(frame_rate));

        if needs_global_header {
            unsafe {
                (*encoder.as_mut_ptr()).flags |=
                    ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let encoder = encoder
            .open_as(codec)
            .map_err(|error| format!("cannot open encoder: {error}"))?;
        stream.set_parameters(&encoder);

        output
            .write_header()
            .map_err(|error| format!("cannot write header: {error}"))?;

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::YUV420P,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| format!("cannot create scaler: {error}"))?;

        Ok(Self {
            output,
            encoder,
            scaler,
            stream_index,
            encoder_time_base,
            next_pts: 0,
        })
    }

    fn write(&mut self, frame: &VideoFrame) -> Result<(), String> {
        let mut converted = VideoFrame::empty();
        self.scaler
            .run(frame, &mut converted)
            .map_err(|error| format!("scaling failed: {error}"))?;
        converted.set_pts(Some(self.next_pts));
        self.next_pts += 1;

        self.encoder
            .send_frame(&converted)
            .map_err(|error| format!("send_frame failed: {error}"))?;
        self.write_packets()
    }

    fn write_packets(&mut self) -> Result<(), String> {
        let output_time_base = self
            .output
            .stream(self.stream_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| "output stream disappeared".to_string())?;

        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, output_time_base);
            packet
                .write_interleaved(&mut self.output)
                .map_err(|error| format!("write packet failed: {error}"))?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<u64, String> {
        self.encoder
            .send_eof()
            .map_err(|error| format!("send_eof failed: {error}"))?;
        self.write_packets()?;
        self.output
            .write_trailer()
            .map_err(|error| format!("cannot write trailer: {error}"))?;
        Ok(self.next_pts as u64)
    }
}
