//! Caption layout and outlined text rendering.
//!
//! Captions are bottom-anchored and horizontally centred. Each line is drawn
//! five times: four times in the outline colour, offset one pixel along each
//! diagonal, then once in the fill colour on top. The result reads as an
//! outlined caption over any background.
//!
//! Text measurement and glyph drawing go through the [`TextRasterizer`]
//! trait. [`FontRasterizer`] is the real implementation, backed by `fontdue`.
//!
//! # Example
//!
//! ```no_run
//! use image::RgbaImage;
//! use subgif::caption::{CaptionStyle, FontRasterizer, draw_caption, layout_caption};
//! use subgif::cue::caption_lines;
//!
//! let rasterizer = FontRasterizer::load("font/DejaVuSans.ttf", 14.0)?;
//! let style = CaptionStyle::default();
//! let mut frame = RgbaImage::new(320, 240);
//!
//! let lines = caption_lines("<i>Hello</i>\nworld");
//! let placements = layout_caption(&lines, frame.width(), frame.height(), &rasterizer, &style);
//! draw_caption(&mut frame, &placements, &rasterizer, &style);
//! # Ok::<(), subgif::SubgifError>(())
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use fontdue::{Font, FontSettings, Metrics};
use image::{Rgba, RgbaImage};

use crate::cue::CaptionLine;
use crate::error::SubgifError;

/// Diagonal directions of the four outline passes, in drawing order.
pub const OUTLINE_DIRECTIONS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)];

/// Pixel size of a rendered string.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    /// Advance width of the whole string.
    pub width: f32,
    /// Height from the lowest descender to the highest ascender.
    pub height: f32,
}

/// Text measurement and drawing for a fixed font and size.
///
/// Implementations must be shareable across threads; the parallel runner
/// hands one rasterizer to every worker.
pub trait TextRasterizer: Send + Sync {
    /// Measure `text` as it would be drawn.
    fn measure(&self, text: &str) -> TextMetrics;

    /// Vertical distance between consecutive baselines.
    fn line_height(&self) -> f32;

    /// Draw `text` with its baseline starting at `(x, y)`.
    fn draw(&self, canvas: &mut RgbaImage, x: f32, y: f32, text: &str, color: Rgba<u8>);
}

/// Colours and spacing of a rendered caption.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionStyle {
    /// Colour of the text body.
    pub fill: Rgba<u8>,
    /// Colour of the outline passes.
    pub outline: Rgba<u8>,
    /// How far each outline pass is shifted along its diagonal.
    pub outline_offset: f32,
    /// Gap between the last line's slot and the bottom edge of the frame.
    pub bottom_margin: f32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            fill: Rgba([255, 255, 255, 255]),
            outline: Rgba([0, 0, 0, 255]),
            outline_offset: 1.0,
            bottom_margin: 5.0,
        }
    }
}

/// Where one caption line lands on a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePlacement {
    /// Text of the line.
    pub text: String,
    /// Index of the line within the caption.
    pub line_index: usize,
    /// Left edge of the text.
    pub x: f32,
    /// Baseline of the text.
    pub y: f32,
    /// Measured size of the text.
    pub metrics: TextMetrics,
}

/// Compute the placement of every caption line on a `frame_width` by
/// `frame_height` frame.
///
/// Line `i` of `L` (its position in `lines`) is centred at `x = W/2 - width/2` with its baseline at
/// `y = H - line_height * (L - i) - bottom_margin`, so later lines sit lower
/// and consecutive lines are exactly one line height apart.
pub fn layout_caption<R: TextRasterizer + ?Sized>(
    lines: &[CaptionLine],
    frame_width: u32,
    frame_height: u32,
    rasterizer: &R,
    style: &CaptionStyle,
) -> Vec<LinePlacement> {
    let line_height = rasterizer.line_height();
    let total_lines = lines.len();

    lines
        .iter()
        .enumerate()
        .map(|(position, line)| {
            let metrics = rasterizer.measure(&line.text);
            let x = frame_width as f32 / 2.0 - metrics.width / 2.0;
            let y = frame_height as f32
                - line_height * (total_lines - position) as f32
                - style.bottom_margin;
            LinePlacement {
                text: line.text.clone(),
                line_index: line.line_index,
                x,
                y,
                metrics,
            }
        })
        .collect()
}

/// Draw the laid-out caption onto `canvas`, outline passes first.
pub fn draw_caption<R: TextRasterizer + ?Sized>(
    canvas: &mut RgbaImage,
    placements: &[LinePlacement],
    rasterizer: &R,
    style: &CaptionStyle,
) {
    for placement in placements {
        for (dx, dy) in OUTLINE_DIRECTIONS {
            rasterizer.draw(
                canvas,
                placement.x + dx * style.outline_offset,
                placement.y + dy * style.outline_offset,
                &placement.text,
                style.outline,
            );
        }
        rasterizer.draw(canvas, placement.x, placement.y, &placement.text, style.fill);
    }
}

#[derive(Debug)]
struct Glyph {
    metrics: Metrics,
    coverage: Vec<u8>,
}

/// [`TextRasterizer`] backed by a TrueType/OpenType font.
///
/// Font and size are fixed at construction. Measurements are cached per
/// string and rasterised glyphs per character.
pub struct FontRasterizer {
    font: Font,
    font_size: f32,
    path: PathBuf,
    metrics_cache: Mutex<HashMap<String, TextMetrics>>,
    glyph_cache: Mutex<HashMap<char, Glyph>>,
}

impl std::fmt::Debug for FontRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRasterizer")
            .field("path", &self.path)
            .field("font_size", &self.font_size)
            .finish_non_exhaustive()
    }
}

impl FontRasterizer {
    /// Load a font file and fix the pixel size.
    ///
    /// # Errors
    ///
    /// Returns [`SubgifError::FontError`] if the file cannot be read or is
    /// not a font `fontdue` understands, or if `font_size` is not positive.
    pub fn load<P: AsRef<Path>>(path: P, font_size: f32) -> Result<Self, SubgifError> {
        let path = path.as_ref();
        let font_error = |reason: String| SubgifError::FontError {
            path: path.to_path_buf(),
            reason,
        };

        if !(font_size.is_finite() && font_size > 0.0) {
            return Err(font_error(format!("invalid font size {font_size}")));
        }

        let bytes = std::fs::read(path).map_err(|error| font_error(error.to_string()))?;
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|error| font_error(error.to_string()))?;

        log::debug!("Loaded font {} at {font_size}px", path.display());

        Ok(Self {
            font,
            font_size,
            path: path.to_path_buf(),
            metrics_cache: Mutex::new(HashMap::new()),
            glyph_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Pixel size the font renders at.
    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    fn vertical_extent(&self) -> (f32, f32) {
        match self.font.horizontal_line_metrics(self.font_size) {
            Some(line) => (line.ascent, line.descent),
            None => (self.font_size, 0.0),
        }
    }

    fn advance_width(&self, text: &str) -> f32 {
        let mut width = 0.0;
        let mut previous: Option<char> = None;
        for c in text.chars() {
            if let Some(left) = previous {
                width += self
                    .font
                    .horizontal_kern(left, c, self.font_size)
                    .unwrap_or(0.0);
            }
            width += self.font.metrics(c, self.font_size).advance_width;
            previous = Some(c);
        }
        width
    }
}

impl TextRasterizer for FontRasterizer {
    fn measure(&self, text: &str) -> TextMetrics {
        let mut cache = self
            .metrics_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(metrics) = cache.get(text) {
            return *metrics;
        }

        let (ascent, descent) = self.vertical_extent();
        let metrics = TextMetrics {
            width: self.advance_width(text),
            height: ascent - descent,
        };
        cache.insert(text.to_string(), metrics);
        metrics
    }

    fn line_height(&self) -> f32 {
        match self.font.horizontal_line_metrics(self.font_size) {
            Some(line) => line.new_line_size,
            None => self.font_size,
        }
    }

    fn draw(&self, canvas: &mut RgbaImage, x: f32, y: f32, text: &str, color: Rgba<u8>) {
        let mut glyphs = self
            .glyph_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut pen_x = x;
        let mut previous: Option<char> = None;

        for c in text.chars() {
            if let Some(left) = previous {
                pen_x += self
                    .font
                    .horizontal_kern(left, c, self.font_size)
                    .unwrap_or(0.0);
            }
            previous = Some(c);

            let glyph = glyphs.entry(c).or_insert_with(|| {
                let (metrics, coverage) = self.font.rasterize(c, self.font_size);
                Glyph { metrics, coverage }
            });

            let left = (pen_x + glyph.metrics.xmin as f32).round() as i64;
            let top =
                (y - glyph.metrics.ymin as f32 - glyph.metrics.height as f32).round() as i64;
            blend_coverage(
                canvas,
                left,
                top,
                glyph.metrics.width,
                &glyph.coverage,
                color,
            );

            pen_x += glyph.metrics.advance_width;
        }
    }
}

/// Alpha-blend an 8-bit coverage mask onto `canvas` with its top-left corner
/// at `(left, top)`. Pixels falling outside the canvas are clipped.
pub(crate) fn blend_coverage(
    canvas: &mut RgbaImage,
    left: i64,
    top: i64,
    mask_width: usize,
    coverage: &[u8],
    color: Rgba<u8>,
) {
    if mask_width == 0 {
        return;
    }
    let canvas_width = i64::from(canvas.width());
    let canvas_height = i64::from(canvas.height());

    for (row, row_coverage) in coverage.chunks(mask_width).enumerate() {
        let py = top + row as i64;
        if py < 0 || py >= canvas_height {
            continue;
        }
        for (column, &value) in row_coverage.iter().enumerate() {
            let px = left + column as i64;
            if value == 0 || px < 0 || px >= canvas_width {
                continue;
            }
            let alpha = (f32::from(value) / 255.0) * (f32::from(color[3]) / 255.0);
            let pixel = canvas.get_pixel_mut(px as u32, py as u32);
            for channel in 0..3 {
                let blended = f32::from(pixel[channel]) * (1.0 - alpha)
                    + f32::from(color[channel]) * alpha;
                pixel[channel] = blended.round().clamp(0.0, 255.0) as u8;
            }
            let blended_alpha = f32::from(pixel[3]) + (255.0 - f32::from(pixel[3])) * alpha;
            pixel[3] = blended_alpha.round().clamp(0.0, 255.0) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_clips_outside_canvas() {
        let mut canvas = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        blend_coverage(&mut canvas, -1, -1, 2, &[255, 255, 255, 255], Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(1, 1), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn partial_coverage_blends() {
        let mut canvas = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        blend_coverage(&mut canvas, 0, 0, 1, &[128], Rgba([255, 255, 255, 255]));
        let value = canvas.get_pixel(0, 0)[0];
        assert!((127..=129).contains(&value), "got {value}");
    }
}
