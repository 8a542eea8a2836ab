//! Error types for the `subgif` crate.
//!
//! This module defines [`SubgifError`], the unified error type returned by all
//! fallible operations in the crate. Per-cue variants carry the timing range
//! or path involved so a failed cue can be diagnosed from the log line alone.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `subgif` operations.
///
/// Only the startup variants ([`InputOpen`](SubgifError::InputOpen),
/// [`FontError`](SubgifError::FontError) and
/// [`FilesystemError`](SubgifError::FilesystemError) raised while preparing
/// directories) and [`Cancelled`](SubgifError::Cancelled) end a run. Every
/// other variant is recovered per cue by the [`Pipeline`](crate::Pipeline).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubgifError {
    /// An input file (video or subtitles) could not be opened or read.
    #[error("Failed to open input file at {path}: {reason}")]
    InputOpen {
        /// Path of the input that failed.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// A timestamp did not match the `HH:MM:SS,mmm` shape.
    #[error("Malformed timestamp: {0:?}")]
    ParseError(String),

    /// The media toolkit could not cut the requested range out of the source.
    #[error("Clip extraction failed for {start} --> {end}: {reason}")]
    ClipExtractionError {
        /// Start of the requested range, as written in the subtitle file.
        start: String,
        /// End of the requested range, as written in the subtitle file.
        end: String,
        /// Diagnostic from the toolkit.
        reason: String,
    },

    /// Decoding the clip produced no frames at all.
    #[error("No frames extracted from clip {0}")]
    NoFramesExtractedError(PathBuf),

    /// The animated output could not be assembled or written.
    #[error("Animation encoding error: {0}")]
    EncodingError(String),

    /// The caption font could not be loaded.
    #[error("Failed to load font {path}: {reason}")]
    FontError {
        /// Path to the font file.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Creating or removing a directory or file failed.
    #[error("Filesystem error at {path}: {source}")]
    FilesystemError {
        /// Path that was being created or removed.
        path: PathBuf,
        /// The I/O error.
        #[source]
        source: IoError,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while loading or saving a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The run was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for SubgifError {
    fn from(error: FfmpegError) -> Self {
        SubgifError::FfmpegError(error.to_string())
    }
}

impl SubgifError {
    /// Wrap an I/O error with the path it concerns.
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: IoError) -> Self {
        SubgifError::FilesystemError {
            path: path.into(),
            source,
        }
    }
}
