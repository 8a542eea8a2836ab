//! Configuration defaults, builder behaviour and cancellation tokens.

use std::path::Path;
use std::time::Duration;

use subgif::config::{DEFAULT_FONT_PATH, DEFAULT_OUTPUT_DIR, DEFAULT_WORKING_DIR};
use subgif::sampling::{DEFAULT_FRAMES_PER_CUE, DEFAULT_SAMPLE_INTERVAL};
use subgif::{CancellationToken, FfmpegLogLevel, PipelineConfig};

#[test]
fn defaults() {
    let config = PipelineConfig::new();
    assert_eq!(config.font_path(), Path::new(DEFAULT_FONT_PATH));
    assert_eq!(config.font_size(), 14.0);
    assert_eq!(config.working_dir(), Path::new(DEFAULT_WORKING_DIR));
    assert_eq!(config.output_dir(), Path::new(DEFAULT_OUTPUT_DIR));
    assert_eq!(config.sampling().max_frames, DEFAULT_FRAMES_PER_CUE);
    assert_eq!(config.sampling().interval, DEFAULT_SAMPLE_INTERVAL);
}

#[test]
fn builder_sets_values() {
    let config = PipelineConfig::new()
        .with_font("fonts/Other.ttf", 22.5)
        .with_working_dir("tmp/work")
        .with_output_dir("tmp/out")
        .with_frames_per_cue(12)
        .with_sample_interval(Duration::from_millis(250));

    assert_eq!(config.font_path(), Path::new("fonts/Other.ttf"));
    assert_eq!(config.font_size(), 22.5);
    assert_eq!(config.working_dir(), Path::new("tmp/work"));
    assert_eq!(config.output_dir(), Path::new("tmp/out"));
    assert_eq!(config.sampling().max_frames, 12);
    assert_eq!(config.sampling().interval, Duration::from_millis(250));
}

#[test]
fn frames_per_cue_never_zero() {
    let config = PipelineConfig::new().with_frames_per_cue(0);
    assert_eq!(config.sampling().max_frames, 1);
}

#[test]
fn debug_output_names_paths() {
    let rendered = format!("{:?}", PipelineConfig::new().with_output_dir("somewhere"));
    assert!(rendered.contains("somewhere"));
}

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());

    token.cancel();
    assert!(clone.is_cancelled());
    assert!(!CancellationToken::default().is_cancelled());
}

#[test]
fn ffmpeg_log_level_parsing() {
    assert_eq!("quiet".parse::<FfmpegLogLevel>(), Ok(FfmpegLogLevel::Quiet));
    assert_eq!("WARN".parse::<FfmpegLogLevel>(), Ok(FfmpegLogLevel::Warning));
    assert_eq!(FfmpegLogLevel::Debug.to_string(), "debug");
    assert!("loud".parse::<FfmpegLogLevel>().is_err());
}
