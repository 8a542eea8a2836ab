//! The per-cue pipeline controller.
//!
//! [`Pipeline::run`] reads the subtitle file, then walks every cue through
//! `PARSE → CHECK_CACHE → (SKIP | CLAIM → EXTRACT → COMPOSITE → ENCODE →
//! COMMIT) → CLEANUP`. Only startup problems (unreadable inputs, output or
//! working root that cannot be created, unusable font) and cancellation end
//! a run early; a cue that fails is logged, recorded in the
//! [`RunSummary`] and the run moves on.
//!
//! # Example
//!
//! ```no_run
//! use subgif::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::new().with_output_dir("gifs");
//! let mut pipeline = Pipeline::new(config)?;
//! let summary = pipeline.run("episode.mp4", "episode.srt")?;
//! println!("{} generated, {} failed", summary.generated.len(), summary.failed.len());
//! # Ok::<(), subgif::SubgifError>(())
//! ```

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::backend::{FfmpegBackend, MediaBackend};
use crate::caption::{FontRasterizer, TextRasterizer};
use crate::compositor::FrameCompositor;
use crate::config::PipelineConfig;
use crate::cue::{Cue, parse_cues};
use crate::error::SubgifError;
use crate::gif::{GifOptions, encode_gif_from_paths};
use crate::progress::{PipelineStage, ProgressTracker};
use crate::scratch::{OutputClaim, STALE_CLAIM_AGE, ScratchArena};
use crate::timestamp::TimeRange;

/// How a cue treats a `.part` claim that is already on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClaimPolicy {
    /// Nothing else writes this output directory; any claim is a leftover.
    Reclaim,
    /// Other workers may own claims; only abandoned ones are taken over.
    #[cfg_attr(not(feature = "rayon"), allow(dead_code))]
    Exclusive,
}

impl ClaimPolicy {
    fn acquire(self, output: &Path) -> Result<Option<OutputClaim>, SubgifError> {
        match self {
            ClaimPolicy::Reclaim => OutputClaim::reclaim(output),
            ClaimPolicy::Exclusive => OutputClaim::acquire_unless_fresh(output, STALE_CLAIM_AGE),
        }
    }
}

/// What happened to one cue.
#[derive(Debug)]
#[non_exhaustive]
pub enum CueOutcome {
    /// The cue had no usable timing line and was skipped.
    Unparsed,
    /// The output already existed; nothing was done.
    Cached(PathBuf),
    /// Another worker holds the claim on this output.
    Claimed(PathBuf),
    /// A GIF was written.
    Generated {
        /// Path of the new GIF.
        path: PathBuf,
        /// Number of frames it holds.
        frames: usize,
    },
    /// Work on the cue failed.
    Failed(SubgifError),
}

/// A cue that could not be converted.
#[derive(Debug)]
pub struct CueFailure {
    /// Index of the cue in the subtitle file.
    pub index: usize,
    /// Caption text of the cue.
    pub text: String,
    /// What went wrong.
    pub error: SubgifError,
}

/// Totals for a finished run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// GIFs written by this run, in cue order.
    pub generated: Vec<PathBuf>,
    /// Outputs that already existed.
    pub cached: Vec<PathBuf>,
    /// Indexes of cues without a usable timing line.
    pub unparsed: Vec<usize>,
    /// Outputs some other worker was producing.
    pub claimed: Vec<PathBuf>,
    /// Cues that failed.
    pub failed: Vec<CueFailure>,
}

impl RunSummary {
    /// File `outcome` for `cue`.
    pub fn record(&mut self, cue: &Cue, outcome: CueOutcome) {
        match outcome {
            CueOutcome::Unparsed => self.unparsed.push(cue.index),
            CueOutcome::Cached(path) => self.cached.push(path),
            CueOutcome::Claimed(path) => self.claimed.push(path),
            CueOutcome::Generated { path, .. } => self.generated.push(path),
            CueOutcome::Failed(error) => self.failed.push(CueFailure {
                index: cue.index,
                text: cue.text.clone(),
                error,
            }),
        }
    }

    /// `true` if no cue failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Converts a video plus subtitle file into one GIF per cue.
pub struct Pipeline<B = FfmpegBackend, R = FontRasterizer> {
    pub(crate) config: PipelineConfig,
    pub(crate) backend: B,
    pub(crate) rasterizer: R,
}

impl Pipeline<FfmpegBackend, FontRasterizer> {
    /// Build a pipeline on FFmpeg with the configured font.
    ///
    /// # Errors
    ///
    /// Returns [`SubgifError::FontError`] if the font cannot be loaded, or
    /// [`SubgifError::FfmpegError`] if FFmpeg cannot be initialised.
    pub fn new(config: PipelineConfig) -> Result<Self, SubgifError> {
        let rasterizer = FontRasterizer::load(config.font_path(), config.font_size())?;
        let backend = FfmpegBackend::new()?;
        Ok(Self::with_components(config, backend, rasterizer))
    }
}

impl<B: MediaBackend, R: TextRasterizer> Pipeline<B, R> {
    /// Build a pipeline from explicit collaborators.
    pub fn with_components(config: PipelineConfig, backend: B, rasterizer: R) -> Self {
        Self {
            config,
            backend,
            rasterizer,
        }
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Convert every cue of `subtitles` taken from `video`, one after the
    /// other.
    ///
    /// # Errors
    ///
    /// Returns an error only for startup failures (see
    /// [`SubgifError`]) or [`SubgifError::Cancelled`]. Per-cue failures are
    /// reported in [`RunSummary::failed`].
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        video: P,
        subtitles: Q,
    ) -> Result<RunSummary, SubgifError> {
        let video = video.as_ref();
        let cues = prepare_run(&self.config, video, subtitles.as_ref())?;
        let total = cues.len() as u64;
        let start_time = Instant::now();
        let mut summary = RunSummary::default();

        for cue in &cues {
            if self.config.is_cancelled() {
                finish_run(&self.config);
                return Err(SubgifError::Cancelled);
            }
            let outcome = match process_cue(
                &self.config,
                &mut self.backend,
                &self.rasterizer,
                video,
                cue,
                ClaimPolicy::Reclaim,
                total,
                start_time,
            ) {
                Ok(outcome) => outcome,
                Err(error) => {
                    finish_run(&self.config);
                    return Err(error);
                }
            };
            summary.record(cue, outcome);
        }

        finish_run(&self.config);
        log::info!(
            "Run finished: {} generated, {} cached, {} unparsed, {} claimed, {} failed",
            summary.generated.len(),
            summary.cached.len(),
            summary.unparsed.len(),
            summary.claimed.len(),
            summary.failed.len(),
        );
        Ok(summary)
    }
}

/// Validate inputs, create the output and working roots and parse the cues.
pub(crate) fn prepare_run(
    config: &PipelineConfig,
    video: &Path,
    subtitles: &Path,
) -> Result<Vec<Cue>, SubgifError> {
    let input_error = |path: &Path, reason: String| SubgifError::InputOpen {
        path: path.to_path_buf(),
        reason,
    };

    let metadata = fs::metadata(video).map_err(|error| input_error(video, error.to_string()))?;
    if !metadata.is_file() {
        return Err(input_error(video, "not a regular file".to_string()));
    }
    File::open(video).map_err(|error| input_error(video, error.to_string()))?;

    let content =
        fs::read_to_string(subtitles).map_err(|error| input_error(subtitles, error.to_string()))?;

    for directory in [config.output_dir(), config.working_dir()] {
        fs::create_dir_all(directory)
            .map_err(|error| SubgifError::filesystem(directory, error))?;
    }

    let cues = parse_cues(&content);
    log::debug!("Parsed {} cue blocks from {}", cues.len(), subtitles.display());
    Ok(cues)
}

/// Remove the working root if no cue left anything behind.
pub(crate) fn finish_run(config: &PipelineConfig) {
    let working = config.working_dir();
    let is_empty = fs::read_dir(working)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);
    if is_empty {
        if let Err(error) = fs::remove_dir(working) {
            log::warn!("Could not remove {}: {error}", working.display());
        }
    }
}

/// Take one cue through the state machine.
///
/// Only [`SubgifError::Cancelled`] comes back as `Err`; every other failure
/// is folded into [`CueOutcome::Failed`].
#[allow(clippy::too_many_arguments)]
pub(crate) fn process_cue<B: MediaBackend + ?Sized, R: TextRasterizer + ?Sized>(
    config: &PipelineConfig,
    backend: &mut B,
    rasterizer: &R,
    video: &Path,
    cue: &Cue,
    claim_policy: ClaimPolicy,
    total: u64,
    start_time: Instant,
) -> Result<CueOutcome, SubgifError> {
    let Some(range) = cue.timing else {
        log::debug!("Skipping cue {}: no usable timing line", cue.index);
        return Ok(CueOutcome::Unparsed);
    };

    let output = config.output_path_for(cue.index, &cue.text);
    if output.exists() {
        log::debug!("Skipping cue {}: {} exists", cue.index, output.display());
        return Ok(CueOutcome::Cached(output));
    }

    let mut tracker = ProgressTracker::new(
        config.progress.clone(),
        cue.index,
        output.clone(),
        cue.index as u64 + 1,
        Some(total),
        start_time,
    );

    let claim = match claim_policy.acquire(&output) {
        Ok(Some(claim)) => claim,
        Ok(None) => {
            log::warn!(
                "Skipping cue {}: {} is being produced elsewhere",
                cue.index,
                output.display()
            );
            return Ok(CueOutcome::Claimed(output));
        }
        Err(error) => return Ok(fail(cue, &tracker, error)),
    };
    // Another worker may have committed between the check and the claim.
    if output.exists() {
        return Ok(CueOutcome::Cached(output));
    }

    tracker.report(PipelineStage::CueStarted);
    log::info!("Generating {}", output.display());

    match generate(config, backend, rasterizer, video, cue, range, claim, &mut tracker) {
        Ok(frames) => {
            tracker.report(PipelineStage::CueFinished);
            Ok(CueOutcome::Generated {
                path: output,
                frames,
            })
        }
        Err(SubgifError::Cancelled) => Err(SubgifError::Cancelled),
        Err(error) => Ok(fail(cue, &tracker, error)),
    }
}

#[allow(clippy::too_many_arguments)]
fn generate<B: MediaBackend + ?Sized, R: TextRasterizer + ?Sized>(
    config: &PipelineConfig,
    backend: &mut B,
    rasterizer: &R,
    video: &Path,
    cue: &Cue,
    range: TimeRange,
    claim: OutputClaim,
    tracker: &mut ProgressTracker,
) -> Result<usize, SubgifError> {
    let arena = ScratchArena::create(config.working_dir(), cue.index)?;
    let clip = arena.clip_path();

    let written = backend.extract_clip(video, &range, &clip)?;
    if written == 0 {
        return Err(SubgifError::NoFramesExtractedError(clip));
    }
    tracker.report(PipelineStage::ClipExtracted);

    let lines = cue.caption_lines();
    let frames = FrameCompositor::new(rasterizer, &config.caption_style, config.sampling())
        .with_cancellation(config.cancellation.clone())
        .composite_reporting(backend, &clip, &lines, &arena, &mut || tracker.frame_done())?;

    let options = GifOptions::from_timestamps(&frames.timestamps).with_repeat(config.repeat);
    encode_gif_from_paths(&frames.paths, claim.partial_path(), &options)?;
    claim.commit()?;
    Ok(frames.len())
}

fn fail(cue: &Cue, tracker: &ProgressTracker, error: SubgifError) -> CueOutcome {
    log::error!("Cue {} ({:?}) failed: {error}", cue.index, cue.text);
    tracker.report(PipelineStage::CueFailed);
    CueOutcome::Failed(error)
}
