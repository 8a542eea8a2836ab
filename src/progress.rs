//! Progress reporting and cancellation support.
//!
//! The pipeline reports per-cue milestones through [`ProgressCallback`] and
//! stops cooperatively when a [`CancellationToken`] is cancelled. Cached and
//! unparseable cues produce no progress events at all, so a callback that
//! prints one line on [`PipelineStage::CueStarted`] prints exactly one line
//! per GIF actually generated.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use subgif::{Pipeline, PipelineConfig, PipelineStage, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if info.stage == PipelineStage::CueStarted {
//!             println!("Generating {}...", info.output.display());
//!         }
//!     }
//! }
//!
//! let config = PipelineConfig::new().with_progress(Arc::new(PrintProgress));
//! let mut pipeline = Pipeline::new(config)?;
//! pipeline.run("video.mp4", "video.srt")?;
//! # Ok::<(), subgif::SubgifError>(())
//! ```

use std::path::PathBuf;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// The milestone a progress event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PipelineStage {
    /// A cue passed the cache check and work on it is starting.
    CueStarted,
    /// The cue's clip has been cut out of the source video.
    ClipExtracted,
    /// One frame was sampled, captioned and written.
    FrameComposited,
    /// The GIF for the cue has been written.
    CueFinished,
    /// Work on the cue failed; the run moves on to the next cue.
    CueFailed,
}

/// A snapshot of pipeline progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What just happened.
    pub stage: PipelineStage,
    /// Index of the cue being processed.
    pub cue_index: usize,
    /// Output path of the cue being processed.
    pub output: PathBuf,
    /// Cues handled so far in this run, including the current one.
    pub current: u64,
    /// Total cues in the subtitle file.
    pub total: Option<u64>,
    /// Frames composited for the current cue so far.
    pub frames: u64,
    /// Wall-clock time elapsed since the run started.
    pub elapsed: Duration,
}

/// Trait for receiving progress updates during a run.
///
/// Implementations must be [`Send`] and [`Sync`] because the parallel
/// runner invokes callbacks from worker threads.
///
/// Progress callbacks are **infallible**: they observe but cannot halt
/// the run. Use [`CancellationToken`] for cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called at each pipeline milestone.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to stop the run.
/// The pipeline checks the token between cues and between frames.
///
/// # Example
///
/// ```
/// use subgif::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.clone().cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-cue helper that stamps events with run-level counters.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    cue_index: usize,
    output: PathBuf,
    current: u64,
    total: Option<u64>,
    frames: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        cue_index: usize,
        output: PathBuf,
        current: u64,
        total: Option<u64>,
        start_time: Instant,
    ) -> Self {
        Self {
            callback,
            cue_index,
            output,
            current,
            total,
            frames: 0,
            start_time,
        }
    }

    /// Record one composited frame and report it.
    pub(crate) fn frame_done(&mut self) {
        self.frames += 1;
        self.report(PipelineStage::FrameComposited);
    }

    pub(crate) fn report(&self, stage: PipelineStage) {
        let info = ProgressInfo {
            stage,
            cue_index: self.cue_index,
            output: self.output.clone(),
            current: self.current,
            total: self.total,
            frames: self.frames,
            elapsed: self.start_time.elapsed(),
        };
        self.callback.on_progress(&info);
    }
}
