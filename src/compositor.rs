//! Sampling frames from a clip and burning the caption into them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::MediaBackend;
use crate::caption::{CaptionStyle, TextRasterizer, draw_caption, layout_caption};
use crate::cue::CaptionLine;
use crate::error::SubgifError;
use crate::progress::CancellationToken;
use crate::sampling::FrameSampling;
use crate::scratch::ScratchArena;

/// The captioned frames written for one cue, in presentation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositedFrames {
    /// Frame image paths inside the cue's arena.
    pub paths: Vec<PathBuf>,
    /// Presentation timestamp of each frame within the clip.
    pub timestamps: Vec<Duration>,
}

impl CompositedFrames {
    /// Number of frames written.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// `true` if no frame was written.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Draws a cue's caption onto sampled clip frames.
pub struct FrameCompositor<'a, R: TextRasterizer + ?Sized> {
    rasterizer: &'a R,
    style: &'a CaptionStyle,
    sampling: FrameSampling,
    cancellation: Option<CancellationToken>,
}

impl<'a, R: TextRasterizer + ?Sized> FrameCompositor<'a, R> {
    /// Create a compositor drawing with `rasterizer` in `style`.
    pub fn new(rasterizer: &'a R, style: &'a CaptionStyle, sampling: FrameSampling) -> Self {
        Self {
            rasterizer,
            style,
            sampling,
            cancellation: None,
        }
    }

    /// Check `token` before every frame.
    #[must_use]
    pub fn with_cancellation(mut self, token: Option<CancellationToken>) -> Self {
        self.cancellation = token;
        self
    }

    /// Sample `clip`, caption every sampled frame and save it into `arena`.
    ///
    /// # Errors
    ///
    /// Returns [`SubgifError::NoFramesExtractedError`] if the clip yields no
    /// frame, [`SubgifError::Cancelled`] if cancellation was requested, or
    /// whatever the backend or image encoder reports.
    pub fn composite<B: MediaBackend + ?Sized>(
        &self,
        backend: &mut B,
        clip: &Path,
        lines: &[CaptionLine],
        arena: &ScratchArena,
    ) -> Result<CompositedFrames, SubgifError> {
        self.composite_reporting(backend, clip, lines, arena, &mut || {})
    }

    /// [`composite`](Self::composite), calling `on_frame` after each frame
    /// is written.
    pub(crate) fn composite_reporting<B: MediaBackend + ?Sized>(
        &self,
        backend: &mut B,
        clip: &Path,
        lines: &[CaptionLine],
        arena: &ScratchArena,
        on_frame: &mut dyn FnMut(),
    ) -> Result<CompositedFrames, SubgifError> {
        let mut frames = CompositedFrames::default();
        let mut sampler = self.sampling.sampler();

        backend.decode_frames(clip, &mut sampler, &mut |timestamp, mut image| {
            if self.is_cancelled() {
                return Err(SubgifError::Cancelled);
            }

            let placements = layout_caption(
                lines,
                image.width(),
                image.height(),
                self.rasterizer,
                self.style,
            );
            draw_caption(&mut image, &placements, self.rasterizer, self.style);

            let path = arena.frame_path(frames.len() + 1);
            image.save(&path)?;
            log::debug!("Wrote frame {} at {timestamp:?}", path.display());

            frames.paths.push(path);
            frames.timestamps.push(timestamp);
            on_frame();
            Ok(())
        })?;

        if frames.is_empty() {
            return Err(SubgifError::NoFramesExtractedError(clip.to_path_buf()));
        }
        Ok(frames)
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
