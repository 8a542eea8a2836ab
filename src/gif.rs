//! Animated GIF assembly from captioned frame images.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! use subgif::gif::{GifOptions, encode_gif_from_paths};
//!
//! let frames = vec![
//!     PathBuf::from("screenshots/cue-000001/image-00001.png"),
//!     PathBuf::from("screenshots/cue-000001/image-00002.png"),
//! ];
//! encode_gif_from_paths(&frames, "gifs/000001-Hello.gif", &GifOptions::new())?;
//! # Ok::<(), subgif::SubgifError>(())
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

use gif::{Encoder, Frame, Repeat};
use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::error::SubgifError;

/// Delay used when there is no spacing to measure, in hundredths of a second.
pub const DEFAULT_FRAME_DELAY: u16 = 10;

/// Smallest delay written. Many viewers replace 0 and 1 with a slow default.
pub const MIN_FRAME_DELAY: u16 = 2;

/// Quantiser speed for `Frame::from_rgba_speed` (1 best, 30 fastest).
const QUANTIZE_SPEED: i32 = 10;

/// Configuration for animated GIF output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GifOptions {
    /// Delay between frames in hundredths of a second (default: 10 = 100 ms).
    pub frame_delay: u16,
    /// How many times the GIF should repeat. `None` means loop forever.
    pub repeat: Option<u16>,
}

impl Default for GifOptions {
    fn default() -> Self {
        Self {
            frame_delay: DEFAULT_FRAME_DELAY,
            repeat: None,
        }
    }
}

impl GifOptions {
    /// Create a new [`GifOptions`] with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the frame delay from the sampled frame timestamps: the mean
    /// spacing between consecutive frames, so playback runs at the speed the
    /// frames were taken at.
    pub fn from_timestamps(timestamps: &[Duration]) -> Self {
        let frame_delay = match (timestamps.first(), timestamps.last()) {
            (Some(first), Some(last)) if timestamps.len() > 1 => {
                let span = last.saturating_sub(*first);
                let mean = span.as_secs_f64() / (timestamps.len() - 1) as f64;
                let centiseconds = (mean * 100.0).round();
                (centiseconds.min(f64::from(u16::MAX)) as u16).max(MIN_FRAME_DELAY)
            }
            _ => DEFAULT_FRAME_DELAY,
        };
        Self {
            frame_delay,
            repeat: None,
        }
    }

    /// Set the delay between frames in hundredths of a second.
    #[must_use]
    pub fn with_frame_delay(mut self, delay: u16) -> Self {
        self.frame_delay = delay;
        self
    }

    /// Set the repeat count. `None` means loop forever.
    #[must_use]
    pub fn with_repeat(mut self, repeat: Option<u16>) -> Self {
        self.repeat = repeat;
        self
    }
}

/// Encode the images at `paths`, in order, as an animated GIF at
/// `destination`.
///
/// The canvas takes the first frame's size; later frames of another size are
/// resized to it. Each frame is quantised to a 256-colour palette by the
/// `gif` crate's built-in quantiser.
///
/// # Errors
///
/// Returns [`SubgifError::EncodingError`] if `paths` is empty, an image cannot
/// be read, the frame is larger than a GIF allows, or `destination` cannot be
/// written.
pub fn encode_gif_from_paths<P: AsRef<Path>, Q: AsRef<Path>>(
    paths: &[P],
    destination: Q,
    options: &GifOptions,
) -> Result<(), SubgifError> {
    let destination = destination.as_ref();
    log::debug!(
        "Encoding {} frames to GIF file {} (delay={}, repeat={:?})",
        paths.len(),
        destination.display(),
        options.frame_delay,
        options.repeat,
    );

    let Some((first_path, rest)) = paths.split_first() else {
        return Err(SubgifError::EncodingError(
            "no frames to encode".to_string(),
        ));
    };

    let first = load_frame(first_path.as_ref())?;
    let (width, height) = first.dimensions();
    let gif_width = u16::try_from(width).map_err(|_| too_large(width, height))?;
    let gif_height = u16::try_from(height).map_err(|_| too_large(width, height))?;

    let file = File::create(destination).map_err(|error| {
        SubgifError::EncodingError(format!(
            "Failed to create GIF file {}: {error}",
            destination.display()
        ))
    })?;

    let mut encoder = Encoder::new(BufWriter::new(file), gif_width, gif_height, &[])
        .map_err(|error| {
            SubgifError::EncodingError(format!("Failed to create GIF encoder: {error}"))
        })?;

    let repeat = match options.repeat {
        None => Repeat::Infinite,
        Some(count) => Repeat::Finite(count),
    };
    encoder.set_repeat(repeat).map_err(|error| {
        SubgifError::EncodingError(format!("Failed to set GIF repeat: {error}"))
    })?;

    write_frame(&mut encoder, first, gif_width, gif_height, options.frame_delay)?;
    for path in rest {
        let mut image = load_frame(path.as_ref())?;
        if image.dimensions() != (width, height) {
            log::debug!(
                "Resizing {} from {:?} to {width}x{height}",
                path.as_ref().display(),
                image.dimensions()
            );
            image = imageops::resize(&image, width, height, FilterType::Triangle);
        }
        write_frame(&mut encoder, image, gif_width, gif_height, options.frame_delay)?;
    }

    encoder
        .into_inner()
        .and_then(|mut writer| std::io::Write::flush(&mut writer))
        .map_err(|error| {
            SubgifError::EncodingError(format!(
                "Failed to finish GIF file {}: {error}",
                destination.display()
            ))
        })
}

fn load_frame(path: &Path) -> Result<RgbaImage, SubgifError> {
    image::open(path)
        .map(|image| image.to_rgba8())
        .map_err(|error| {
            SubgifError::EncodingError(format!(
                "Failed to read frame {}: {error}",
                path.display()
            ))
        })
}

fn write_frame<W: std::io::Write>(
    encoder: &mut Encoder<W>,
    image: RgbaImage,
    width: u16,
    height: u16,
    delay: u16,
) -> Result<(), SubgifError> {
    let mut pixels = image.into_raw();
    let mut frame = Frame::from_rgba_speed(width, height, &mut pixels, QUANTIZE_SPEED);
    frame.delay = delay;
    encoder.write_frame(&frame).map_err(|error| {
        SubgifError::EncodingError(format!("Failed to write GIF frame: {error}"))
    })
}

fn too_large(width: u32, height: u32) -> SubgifError {
    SubgifError::EncodingError(format!(
        "Frame size {width}x{height} exceeds the GIF limit of 65535x65535"
    ))
}
