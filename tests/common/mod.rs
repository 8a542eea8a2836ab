//! Shared fakes for the integration tests.
//!
//! `FakeBackend` stands in for FFmpeg: it writes a placeholder clip and
//! yields solid-colour frames. `BlockRasterizer` stands in for a font: every
//! character is 6 px wide, lines are 10 px tall, and every draw call is
//! recorded.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{Rgba, RgbaImage};
use subgif::{
    FrameSampler, FrameVisitor, MediaBackend, ProgressCallback, ProgressInfo, SubgifError,
    TextMetrics, TextRasterizer, TimeRange,
};

pub const CHAR_WIDTH: f32 = 6.0;
pub const LINE_HEIGHT: f32 = 10.0;

#[derive(Debug, Clone)]
pub struct FakeBackend {
    pub frames: usize,
    pub width: u32,
    pub height: u32,
    pub spacing: Duration,
    /// Cue start times whose extraction fails.
    pub failing_starts: Vec<Duration>,
    pub extract_calls: Arc<AtomicUsize>,
    pub decode_calls: Arc<AtomicUsize>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            frames: 5,
            width: 64,
            height: 48,
            spacing: Duration::from_millis(40),
            failing_starts: Vec::new(),
            extract_calls: Arc::new(AtomicUsize::new(0)),
            decode_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl FakeBackend {
    pub fn with_frames(frames: usize) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    pub fn failing_at(mut self, start: Duration) -> Self {
        self.failing_starts.push(start);
        self
    }

    pub fn extractions(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }
}

impl MediaBackend for FakeBackend {
    fn extract_clip(
        &mut self,
        _source: &Path,
        range: &TimeRange,
        destination: &Path,
    ) -> Result<u64, SubgifError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_starts.contains(&range.start.as_duration()) {
            return Err(SubgifError::ClipExtractionError {
                start: range.start.to_string(),
                end: range.end.to_string(),
                reason: "fake failure".to_string(),
            });
        }
        fs::write(destination, b"fake clip")?;
        Ok(self.frames as u64)
    }

    fn decode_frames(
        &mut self,
        clip: &Path,
        sampler: &mut FrameSampler,
        visit: &mut FrameVisitor<'_>,
    ) -> Result<(), SubgifError> {
        self.decode_calls.fetch_add(1, Ordering::SeqCst);
        assert!(clip.exists(), "clip must be extracted before decoding");

        for number in 0..self.frames {
            let timestamp = self.spacing * number as u32;
            if !sampler.accept(timestamp) {
                continue;
            }
            let shade = (number * 40 % 256) as u8;
            let image = RgbaImage::from_pixel(self.width, self.height, Rgba([shade, 90, 160, 255]));
            visit(timestamp, image)?;
            if sampler.is_exhausted() {
                break;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub color: Rgba<u8>,
}

#[derive(Debug, Default)]
pub struct BlockRasterizer {
    pub calls: Mutex<Vec<DrawCall>>,
}

impl BlockRasterizer {
    pub fn calls(&self) -> Vec<DrawCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl TextRasterizer for BlockRasterizer {
    fn measure(&self, text: &str) -> TextMetrics {
        TextMetrics {
            width: text.chars().count() as f32 * CHAR_WIDTH,
            height: LINE_HEIGHT,
        }
    }

    fn line_height(&self) -> f32 {
        LINE_HEIGHT
    }

    fn draw(&self, canvas: &mut RgbaImage, x: f32, y: f32, text: &str, color: Rgba<u8>) {
        let (px, py) = (x.round() as i64, y.round() as i64);
        if px >= 0 && py >= 0 && (px as u32) < canvas.width() && (py as u32) < canvas.height() {
            canvas.put_pixel(px as u32, py as u32, color);
        }
        self.calls.lock().unwrap().push(DrawCall {
            x,
            y,
            text: text.to_string(),
            color,
        });
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    pub infos: Mutex<Vec<ProgressInfo>>,
}

impl RecordingProgress {
    pub fn infos(&self) -> Vec<ProgressInfo> {
        self.infos.lock().unwrap().clone()
    }
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.infos.lock().unwrap().push(info.clone());
    }
}

/// Three well-formed cues, starting at 1 s, 3 s and 5 s.
pub const THREE_CUES: &str = "1
00:00:01,000 --> 00:00:02,000
Hello, world!

2
00:00:03,000 --> 00:00:04,500
<i>Second</i> line
goes here

3
00:00:05,000 --> 00:00:06,000
Third
";

/// Directory listing with file contents, sorted by name.
pub fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut entries: Vec<(String, Vec<u8>)> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|entry| {
                let entry = entry.unwrap();
                (
                    entry.file_name().to_string_lossy().into_owned(),
                    fs::read(entry.path()).unwrap(),
                )
            })
            .collect(),
        Err(_) => Vec::new(),
    };
    entries.sort();
    entries
}
