use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use subgif::{
    FfmpegLogLevel, Pipeline, PipelineConfig, PipelineStage, ProgressCallback, ProgressInfo,
    RunSummary,
    config::{DEFAULT_FONT_PATH, DEFAULT_FONT_SIZE, DEFAULT_OUTPUT_DIR, DEFAULT_WORKING_DIR},
    sampling::{DEFAULT_FRAMES_PER_CUE, DEFAULT_SAMPLE_INTERVAL},
};

const CLI_AFTER_HELP: &str = "Examples:\n  subgif convert episode.mp4 episode.srt\n  subgif convert episode.mp4 episode.srt --out gifs --frames-per-cue 30 --progress\n  subgif convert episode.mp4 episode.srt --font fonts/Impact.ttf --font-size 24 --json\n  subgif completions zsh > _subgif";

#[derive(Debug, Parser)]
#[command(
    name = "subgif",
    version,
    about = "Turn every subtitle cue of a video into a captioned, looping GIF",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate one GIF per subtitle cue.
    #[command(
        about = "Generate captioned GIFs from a video and its subtitles",
        after_help = "Examples:\n  subgif convert episode.mp4 episode.srt\n  subgif convert episode.mp4 episode.srt --lowercase --sample-interval-ms 50"
    )]
    Convert {
        /// Source video.
        video: PathBuf,
        /// Subtitle file with `start --> end` timed cues.
        subtitles: PathBuf,
        /// Directory the GIFs are written to.
        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        out: PathBuf,
        /// Scratch directory for clips and frames.
        #[arg(long, default_value = DEFAULT_WORKING_DIR)]
        work: PathBuf,
        /// TrueType/OpenType font for captions.
        #[arg(long, default_value = DEFAULT_FONT_PATH)]
        font: PathBuf,
        /// Caption font size in pixels.
        #[arg(long, default_value_t = DEFAULT_FONT_SIZE)]
        font_size: f32,
        /// Maximum number of frames sampled per cue.
        #[arg(long, default_value_t = DEFAULT_FRAMES_PER_CUE)]
        frames_per_cue: u32,
        /// Minimum spacing between sampled frames, in milliseconds.
        #[arg(long, default_value_t = DEFAULT_SAMPLE_INTERVAL.as_millis() as u64)]
        sample_interval_ms: u64,
        /// Lowercase the slug part of output file names.
        #[arg(long)]
        lowercase: bool,
        /// Process cues on N worker threads (requires the `rayon` feature).
        #[arg(long)]
        threads: Option<usize>,
        /// Print the run summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let config = ConfigBuilder::new()
        .add_filter_allow_str("subgif")
        .build();
    if TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto).is_err() {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            "logger already initialised".yellow()
        );
    }
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(global.verbose);

    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level
            .parse()
            .map_err(|error: String| format!("unsupported --log-level: {error}"))?;
        subgif::set_ffmpeg_log_level(parsed);
    }

    Ok(())
}

/// Prints one line per generated GIF, optionally above a progress bar.
struct TerminalProgress {
    bar: Option<ProgressBar>,
}

impl TerminalProgress {
    fn new(show_bar: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = if show_bar {
            let bar = ProgressBar::new(0);
            let style =
                ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
            bar.set_style(style.progress_chars("##-"));
            Some(bar)
        } else {
            None
        };
        Ok(Self { bar })
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.stage == PipelineStage::CueStarted {
            let line = format!("Generating {}...", info.output.display());
            match &self.bar {
                Some(bar) => bar.println(line),
                None => println!("{line}"),
            }
        }

        if let Some(bar) = &self.bar {
            if let Some(total) = info.total {
                bar.set_length(total);
            }
            bar.set_position(info.current);
            bar.set_message(format!("{} frames", info.frames));
        }
    }
}

fn run_pipeline(
    pipeline: &mut Pipeline,
    video: &Path,
    subtitles: &Path,
    threads: Option<usize>,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    #[cfg(feature = "rayon")]
    if threads.is_some() {
        return Ok(pipeline.run_parallel(video, subtitles)?);
    }

    #[cfg(not(feature = "rayon"))]
    if threads.is_some() {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            "--threads requires building with the `rayon` feature; running sequentially".yellow()
        );
    }

    Ok(pipeline.run(video, subtitles)?)
}

fn summary_json(summary: &RunSummary) -> serde_json::Value {
    json!({
        "generated": summary.generated,
        "cached": summary.cached,
        "unparsed": summary.unparsed,
        "claimed": summary.claimed,
        "failed": summary
            .failed
            .iter()
            .map(|failure| json!({
                "index": failure.index,
                "text": failure.text,
                "error": failure.error.to_string(),
            }))
            .collect::<Vec<_>>(),
    })
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Convert {
            video,
            subtitles,
            out,
            work,
            font,
            font_size,
            frames_per_cue,
            sample_interval_ms,
            lowercase,
            threads,
            json,
        } => {
            if frames_per_cue == 0 {
                return Err("--frames-per-cue must be at least 1".into());
            }

            let progress = Arc::new(TerminalProgress::new(cli.global.progress)?);
            let mut config = PipelineConfig::new()
                .with_font(font, font_size)
                .with_output_dir(out)
                .with_working_dir(work)
                .with_frames_per_cue(frames_per_cue)
                .with_sample_interval(Duration::from_millis(sample_interval_ms))
                .with_lowercase_slugs(lowercase)
                .with_progress(progress.clone());
            if let Some(threads) = threads {
                config = config.with_threads(threads);
            }

            let mut pipeline = Pipeline::new(config)?;
            let summary = run_pipeline(&mut pipeline, &video, &subtitles, threads);
            progress.finish();
            let summary = summary?;

            for failure in &summary.failed {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!(
                        "cue {} ({:?}) failed: {}",
                        failure.index, failure.text, failure.error
                    )
                    .yellow()
                );
            }

            for claimed in &summary.claimed {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("skipped {}: claimed by another run", claimed.display()).yellow()
                );
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&summary_json(&summary))?);
            } else if cli.global.verbose {
                eprintln!(
                    "{} {} generated, {} cached, {} skipped, {} claimed, {} failed",
                    "done".green().bold(),
                    summary.generated.len(),
                    summary.cached.len(),
                    summary.unparsed.len(),
                    summary.claimed.len(),
                    summary.failed.len()
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "subgif", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
