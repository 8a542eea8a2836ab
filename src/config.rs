//! Pipeline configuration.
//!
//! [`PipelineConfig`] is a builder holding everything the pipeline used to
//! take from globals: font, font size, directories, sampling bounds, caption
//! style, plus the progress callback and cancellation token.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use subgif::{CancellationToken, PipelineConfig};
//!
//! let token = CancellationToken::new();
//! let config = PipelineConfig::new()
//!     .with_font("fonts/DejaVuSans-Bold.ttf", 18.0)
//!     .with_output_dir("out/gifs")
//!     .with_frames_per_cue(40)
//!     .with_sample_interval(Duration::from_millis(80))
//!     .with_cancellation(token.clone());
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::caption::CaptionStyle;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};
use crate::sampling::FrameSampling;

/// Default caption font.
pub const DEFAULT_FONT_PATH: &str = "font/DejaVuSansCondensed-BoldOblique.ttf";
/// Default caption size in pixels.
pub const DEFAULT_FONT_SIZE: f32 = 14.0;
/// Default scratch root.
pub const DEFAULT_WORKING_DIR: &str = "screenshots";
/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "gifs";
/// Extension of generated files.
pub const OUTPUT_EXTENSION: &str = "gif";

/// Configuration for a [`Pipeline`](crate::Pipeline).
///
/// All fields have defaults; a default-constructed config reproduces the
/// classic layout (`gifs/` output, `screenshots/` scratch, 14 px caption).
#[derive(Clone)]
pub struct PipelineConfig {
    pub(crate) font_path: PathBuf,
    pub(crate) font_size: f32,
    pub(crate) working_dir: PathBuf,
    pub(crate) output_dir: PathBuf,
    pub(crate) sampling: FrameSampling,
    pub(crate) caption_style: CaptionStyle,
    pub(crate) lowercase_slugs: bool,
    /// GIF repeat count. `None` loops forever.
    pub(crate) repeat: Option<u16>,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    /// Worker count for the parallel runner. `None` lets rayon decide.
    #[cfg_attr(not(feature = "rayon"), allow(dead_code))]
    pub(crate) threads: Option<usize>,
}

impl Debug for PipelineConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PipelineConfig")
            .field("font_path", &self.font_path)
            .field("font_size", &self.font_size)
            .field("working_dir", &self.working_dir)
            .field("output_dir", &self.output_dir)
            .field("frames_per_cue", &self.sampling.max_frames)
            .field("sample_interval", &self.sampling.interval)
            .field("lowercase_slugs", &self.lowercase_slugs)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("threads", &self.threads)
            .finish()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
            font_size: DEFAULT_FONT_SIZE,
            working_dir: PathBuf::from(DEFAULT_WORKING_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            sampling: FrameSampling::default(),
            caption_style: CaptionStyle::default(),
            lowercase_slugs: false,
            repeat: None,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            threads: None,
        }
    }

    /// Set the caption font file and pixel size.
    #[must_use]
    pub fn with_font<P: Into<PathBuf>>(mut self, path: P, size: f32) -> Self {
        self.font_path = path.into();
        self.font_size = size;
        self
    }

    /// Set the scratch root. Each cue works in its own subdirectory.
    #[must_use]
    pub fn with_working_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.working_dir = path.into();
        self
    }

    /// Set the directory finished GIFs are written to.
    #[must_use]
    pub fn with_output_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_dir = path.into();
        self
    }

    /// Bound the number of frames sampled per cue. Clamped to at least 1.
    #[must_use]
    pub fn with_frames_per_cue(mut self, frames: u32) -> Self {
        self.sampling.max_frames = frames.max(1);
        self
    }

    /// Set the minimum spacing between sampled frames. Zero keeps every
    /// decoded frame up to the frame bound.
    #[must_use]
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sampling.interval = interval;
        self
    }

    /// Set the caption colours and spacing.
    #[must_use]
    pub fn with_caption_style(mut self, style: CaptionStyle) -> Self {
        self.caption_style = style;
        self
    }

    /// Lowercase the slug part of output file names.
    #[must_use]
    pub fn with_lowercase_slugs(mut self, lowercase: bool) -> Self {
        self.lowercase_slugs = lowercase;
        self
    }

    /// Set how many times each GIF repeats. `None` loops forever.
    #[must_use]
    pub fn with_repeat(mut self, repeat: Option<u16>) -> Self {
        self.repeat = repeat;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled the run stops at the next cue or frame
    /// boundary and returns [`SubgifError::Cancelled`](crate::SubgifError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set the worker count used by `Pipeline::run_parallel`.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads.max(1));
        self
    }

    /// Caption font file.
    pub fn font_path(&self) -> &Path {
        &self.font_path
    }

    /// Caption size in pixels.
    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Scratch root.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Frame sampling policy.
    pub fn sampling(&self) -> FrameSampling {
        self.sampling
    }

    /// Output path for a cue under this configuration.
    pub fn output_path_for(&self, index: usize, text: &str) -> PathBuf {
        crate::filename::output_path(
            &self.output_dir,
            index,
            text,
            self.lowercase_slugs,
            OUTPUT_EXTENSION,
        )
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
