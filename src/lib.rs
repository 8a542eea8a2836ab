//! # subgif
//!
//! Turn a video plus its subtitle file into one short, looping GIF per
//! subtitle cue, with the cue text burned into every frame as a white,
//! black-outlined caption.
//!
//! `subgif` cuts each cue's time range out of the video with FFmpeg (via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate), samples
//! frames from the clip, draws the caption with [`fontdue`] and assembles the
//! frames with the [`gif`](https://crates.io/crates/gif) crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use subgif::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::new()
//!     .with_font("font/DejaVuSansCondensed-BoldOblique.ttf", 14.0)
//!     .with_output_dir("gifs")
//!     .with_working_dir("screenshots");
//!
//! let mut pipeline = Pipeline::new(config).unwrap();
//! let summary = pipeline.run("episode.mp4", "episode.srt").unwrap();
//! for failure in &summary.failed {
//!     eprintln!("cue {} failed: {}", failure.index, failure.error);
//! }
//! ```
//!
//! Outputs are named `<index:06>-<slug>.gif`. A cue whose output already
//! exists is skipped without touching the video, so re-running over the
//! same inputs only fills in what is missing.
//!
//! ## Features
//!
//! - **Cue parsing** for `start --> end` timed blocks (SRT style), with HTML
//!   tags and `{\...}` override blocks stripped from captions
//! - **Configurable sampling**: frames per cue and minimum spacing between
//!   sampled frames
//! - **Outlined captions**: centred, bottom-anchored, four-direction stroke
//! - **Crash-safe outputs**: GIFs are written to `<output>.part` and renamed
//!   into place when complete
//! - **Per-cue scratch directories** removed as soon as the cue is done
//! - **Progress & cancellation**: [`ProgressCallback`] and
//!   [`CancellationToken`]
//! - **Pluggable collaborators**: [`MediaBackend`] and [`TextRasterizer`]
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | `Pipeline::run_parallel()` processes cues on a rayon pool |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system, with an
//! H.264 or MPEG-4 encoder enabled.

pub mod backend;
pub mod caption;
pub mod clip;
pub mod compositor;
pub mod config;
pub mod cue;
pub mod error;
pub mod ffmpeg;
pub mod filename;
pub mod gif;
#[cfg(feature = "rayon")]
mod parallel;
pub mod pipeline;
pub mod progress;
pub mod sampling;
pub mod scratch;
pub mod timestamp;
mod utilities;

pub use backend::{FfmpegBackend, FrameVisitor, MediaBackend};
pub use caption::{
    CaptionStyle, FontRasterizer, LinePlacement, TextMetrics, TextRasterizer, draw_caption,
    layout_caption,
};
pub use clip::ClipExtractor;
pub use compositor::{CompositedFrames, FrameCompositor};
pub use config::PipelineConfig;
pub use cue::{CaptionLine, Cue, parse_cues};
pub use error::SubgifError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use filename::{output_file_name, output_path, slugify};
pub use gif::{GifOptions, encode_gif_from_paths};
pub use pipeline::{CueFailure, CueOutcome, Pipeline, RunSummary};
pub use progress::{CancellationToken, PipelineStage, ProgressCallback, ProgressInfo};
pub use sampling::{FrameSampler, FrameSampling};
pub use scratch::{OutputClaim, ScratchArena};
pub use timestamp::{TimeRange, Timestamp, parse_end, parse_start, parse_time_range};
