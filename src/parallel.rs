//! Parallel cue processing.
//!
//! [`Pipeline::run_parallel`] distributes cues across a [`rayon`] pool. Each
//! worker gets its own clone of the media backend and every cue keeps its own
//! scratch arena, so the only shared state is the output directory, where the
//! `.part` claim keeps two workers from producing the same GIF. Claims older
//! than [`STALE_CLAIM_AGE`](crate::scratch::STALE_CLAIM_AGE) are taken over.

use std::io;
use std::path::Path;
use std::time::Instant;

use rayon::ThreadPoolBuilder;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::backend::MediaBackend;
use crate::caption::TextRasterizer;
use crate::error::SubgifError;
use crate::pipeline::{
    ClaimPolicy, CueOutcome, Pipeline, RunSummary, finish_run, prepare_run, process_cue,
};

impl<B, R> Pipeline<B, R>
where
    B: MediaBackend + Clone + Send,
    R: TextRasterizer,
{
    /// Like [`run`](Pipeline::run), with cues processed concurrently on
    /// [`PipelineConfig::with_threads`](crate::PipelineConfig::with_threads)
    /// workers (rayon's default when unset).
    ///
    /// Cues may finish in any order; the summary lists them in cue order.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Pipeline::run), plus [`SubgifError::IoError`] if the
    /// worker pool cannot be started.
    pub fn run_parallel<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        video: P,
        subtitles: Q,
    ) -> Result<RunSummary, SubgifError> {
        let video = video.as_ref();
        let cues = prepare_run(&self.config, video, subtitles.as_ref())?;
        let total = cues.len() as u64;
        let start_time = Instant::now();

        let mut builder = ThreadPoolBuilder::new();
        if let Some(threads) = self.config.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|error| SubgifError::IoError(io::Error::other(error.to_string())))?;
        log::debug!("Processing {total} cues on {} workers", pool.current_num_threads());

        let config = &self.config;
        let rasterizer = &self.rasterizer;
        let backend = self.backend.clone();
        let outcomes: Vec<Result<CueOutcome, SubgifError>> = pool.install(|| {
            cues.par_iter()
                .map_with(backend, |backend, cue| {
                    if config.is_cancelled() {
                        return Err(SubgifError::Cancelled);
                    }
                    process_cue(
                        config,
                        backend,
                        rasterizer,
                        video,
                        cue,
                        ClaimPolicy::Exclusive,
                        total,
                        start_time,
                    )
                })
                .collect()
        });

        finish_run(&self.config);

        let mut summary = RunSummary::default();
        for (cue, outcome) in cues.iter().zip(outcomes) {
            summary.record(cue, outcome?);
        }
        Ok(summary)
    }
}
