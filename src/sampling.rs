//! Frame sampling policy.
//!
//! A clip usually holds far more decoded frames than a small looping GIF
//! needs. [`FrameSampling`] bounds how many frames are taken from a clip and
//! how far apart (in presentation time) they must be.

use std::time::Duration;

/// Default spacing between sampled frames (10 frames per second).
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Default upper bound on frames per cue (six seconds at the default spacing).
pub const DEFAULT_FRAMES_PER_CUE: u32 = 60;

/// How frames are picked from a clip.
///
/// The first decoded frame is always taken. After that a frame is taken when
/// its timestamp is at least `interval` past the previously taken frame.
/// Sampling stops once `max_frames` frames were taken. An `interval` of zero
/// takes every decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSampling {
    /// Upper bound on sampled frames. Clamped to at least 1.
    pub max_frames: u32,
    /// Minimum presentation-time spacing between sampled frames.
    pub interval: Duration,
}

impl Default for FrameSampling {
    fn default() -> Self {
        Self {
            max_frames: DEFAULT_FRAMES_PER_CUE,
            interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

impl FrameSampling {
    /// Start a fresh sampler for one clip.
    pub fn sampler(&self) -> FrameSampler {
        FrameSampler {
            max_frames: self.max_frames.max(1),
            interval: self.interval,
            last_taken: None,
            taken: 0,
        }
    }
}

/// Stateful sampler for a single pass over a clip.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    max_frames: u32,
    interval: Duration,
    last_taken: Option<Duration>,
    taken: u32,
}

impl FrameSampler {
    /// Decide whether the frame at `timestamp` is taken. Frames must be
    /// offered in presentation order.
    pub fn accept(&mut self, timestamp: Duration) -> bool {
        if self.is_exhausted() {
            return false;
        }
        let due = match self.last_taken {
            None => true,
            Some(last) => timestamp >= last + self.interval,
        };
        if due {
            self.last_taken = Some(timestamp);
            self.taken += 1;
        }
        due
    }

    /// `true` once the frame bound has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.taken >= self.max_frames
    }

    /// Number of frames taken so far.
    pub fn taken(&self) -> u32 {
        self.taken
    }
}
