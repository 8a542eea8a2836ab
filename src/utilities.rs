//! Internal utility functions.
//!
//! Helpers for pixel-data copying and timestamp conversion shared by the
//! clip extractor and the frame decoder.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × bpp).
/// This strips that padding so the result can go straight into
/// [`image::RgbaImage::from_raw`].
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_length = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_length {
        data[..row_length * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_length * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_length]);
        }
        buffer
    }
}

/// Convert a PTS in `time_base` units to an offset from the stream start.
///
/// Negative timestamps (pre-roll) clamp to zero.
pub(crate) fn pts_to_duration(pts: i64, time_base: Rational) -> Duration {
    let seconds =
        pts as f64 * f64::from(time_base.numerator()) / f64::from(time_base.denominator());
    if seconds.is_finite() && seconds > 0.0 {
        Duration::from_secs_f64(seconds)
    } else {
        Duration::ZERO
    }
}

/// Convert a [`Duration`] to a container seek timestamp in AV_TIME_BASE
/// (microseconds), as expected by `Input::seek`.
pub(crate) fn duration_to_seek_timestamp(duration: Duration) -> i64 {
    duration.as_micros() as i64
}

/// Round a dimension down to an even number, at least 2. YUV 4:2:0 encoders
/// reject odd sizes.
pub(crate) fn even_dimension(value: u32) -> u32 {
    (value & !1).max(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pts_in_stream_time_base() {
        let time_base = Rational::new(1, 90_000);
        assert_eq!(pts_to_duration(135_000, time_base), Duration::from_millis(1500));
        assert_eq!(pts_to_duration(3, Rational::new(1, 30)), Duration::from_millis(100));
    }

    #[test]
    fn negative_pts_clamps() {
        assert_eq!(pts_to_duration(-10, Rational::new(1, 1000)), Duration::ZERO);
    }

    #[test]
    fn even_dimensions() {
        assert_eq!(even_dimension(321), 320);
        assert_eq!(even_dimension(320), 320);
        assert_eq!(even_dimension(1), 2);
    }
}
