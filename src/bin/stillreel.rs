use std::{path::PathBuf, sync::Arc};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use image::imageops::FilterType;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use stillreel::{
    DimensionPolicy, EncodeJob, EncodeOptions, FfmpegLogLevel, FramePaths, FrameSourceOptions,
    OverflowPolicy, ProgressCallback, ProgressInfo, SequenceEncoder, StillreelError, VideoCodec,
};

const CLI_AFTER_HELP: &str = "Examples:\n  stillreel encode shots/ --out clip.mp4 --fps 10 --bitrate 4000000 --progress\n  stillreel encode shots/ --out clip.mpeg --codec mpeg2 --width 1920 --height 1080 --resample\n  stillreel list shots/ --ext jpg --json\n  stillreel check shots/\n  stillreel completions zsh > _stillreel";

#[derive(Debug, Parser)]
#[command(
    name = "stillreel",
    version,
    about = "Encode a directory of still images into a video",
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
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while encoding or checking.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting an existing output file.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

/// Frame listing flags shared by every subcommand that reads a directory.
#[derive(Debug, Parser, Clone)]
struct SourceOptions {
    /// Directory of frame images.
    directory: PathBuf,

    /// Maximum number of frames to read from the directory.
    #[arg(long)]
    max_frames: Option<usize>,

    /// What to do when the directory holds more than --max-frames images.
    #[arg(long, value_enum, default_value_t = Overflow::Truncate)]
    overflow: Overflow,

    /// Only accept these extensions (comma separated, e.g. jpg,png).
    #[arg(long, value_delimiter = ',')]
    ext: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Overflow {
    Truncate,
    Error,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encode the frames of a directory into a video file.
    #[command(
        about = "Encode frames into a video",
        after_help = "Examples:\n  stillreel encode shots/ --out clip.mp4\n  stillreel encode shots/ --out clip.mkv --codec h264 --fps 24 --frames 48"
    )]
    Encode {
        #[command(flatten)]
        source: SourceOptions,
        /// Output video path; the container follows the extension.
        #[arg(long)]
        out: PathBuf,
        /// Frame width. Defaults to the first frame's width.
        #[arg(long)]
        width: Option<u32>,
        /// Frame height. Defaults to the first frame's height.
        #[arg(long)]
        height: Option<u32>,
        /// Frames per second.
        #[arg(long, default_value_t = 10)]
        fps: u32,
        /// Target bitrate in bits per second.
        #[arg(long, default_value_t = 4_000_000)]
        bitrate: usize,
        /// Codec: mpeg1 | mpeg2 | mpeg4 | h264 | h265.
        #[arg(long, default_value = "mpeg4")]
        codec: String,
        /// Encode at most this many frames.
        #[arg(long)]
        frames: Option<u64>,
        /// Resize frames whose size differs from the output instead of failing.
        #[arg(long)]
        resample: bool,
    },

    /// Print the frames in encoding order.
    #[command(about = "List frames in encoding order")]
    List {
        #[command(flatten)]
        source: SourceOptions,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check every frame header without encoding.
    #[command(about = "Validate frames before encoding")]
    Check {
        #[command(flatten)]
        source: SourceOptions,
        /// Expected width.
        #[arg(long, requires = "height")]
        width: Option<u32>,
        /// Expected height.
        #[arg(long, requires = "width")]
        height: Option<u32>,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(total: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(total);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.current);
        if let Some(path) = &info.current_path {
            let name = path.file_name().unwrap_or(path.as_os_str());
            self.bar.set_message(name.to_string_lossy().into_owned());
        }
    }
}

fn list_source(source: &SourceOptions) -> Result<FramePaths, StillreelError> {
    let mut options = FrameSourceOptions::new()
        .with_extensions(&source.ext)
        .with_overflow_policy(match source.overflow {
            Overflow::Truncate => OverflowPolicy::Truncate,
            Overflow::Error => OverflowPolicy::Error,
        });
    if let Some(max) = source.max_frames {
        options = options.with_max_count(max);
    }
    stillreel::list_frames(&source.directory, &options)
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(global);
    let level = match &global.log_level {
        Some(level) => level.parse::<FfmpegLogLevel>()?,
        None if global.verbose => FfmpegLogLevel::Info,
        None => FfmpegLogLevel::Error,
    };
    stillreel::set_ffmpeg_log_level(level);
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Encode {
            source,
            out,
            width,
            height,
            fps,
            bitrate,
            codec,
            frames: frame_limit,
            resample,
        } => {
            if out.exists() {
                if !cli.global.overwrite {
                    return Err(format!(
                        "output already exists: {} (use --overwrite to replace)",
                        out.display()
                    )
                    .into());
                }
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("overwriting {}", out.display()).yellow()
                );
            }

            let frames = list_source(&source)?;
            let first = frames.get(0).ok_or(StillreelError::NoFrames)?;
            let (width, height) = match (width, height) {
                (Some(width), Some(height)) => (width, height),
                (width, height) => {
                    let (probed_width, probed_height) = stillreel::probe_dimensions(first)?;
                    (width.unwrap_or(probed_width), height.unwrap_or(probed_height))
                }
            };

            let mut job = EncodeJob::new(&out, width, height)
                .fps(fps)
                .bitrate(bitrate)
                .codec(codec.parse::<VideoCodec>()?);
            if let Some(limit) = frame_limit {
                job = job.frame_count(limit);
            }

            let mut options = EncodeOptions::new();
            if resample {
                options = options
                    .with_dimension_policy(DimensionPolicy::Resample(FilterType::Lanczos3));
            }
            let total = job
                .frame_count
                .map_or(frames.len() as u64, |limit| limit.min(frames.len() as u64));
            let progress = if cli.global.progress {
                let progress = Arc::new(BarProgress::new(total)?);
                options = options.with_progress(progress.clone());
                Some(progress)
            } else {
                None
            };

            let result = SequenceEncoder::new(job).encode_all_with_options(&frames, &options);
            if let Some(progress) = progress {
                match &result {
                    Ok(_) => progress.bar.finish_with_message("done"),
                    Err(_) => progress.bar.abandon(),
                }
            }
            let submitted = result?;

            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "Encoded {submitted} frame(s) at {width}x{height} to {}",
                    out.display()
                )
                .green()
            );
        }
        Commands::List { source, json } => {
            let frames = list_source(&source)?;
            if json {
                let payload = json!({
                    "directory": source.directory.display().to_string(),
                    "count": frames.len(),
                    "frames": frames
                        .iter()
                        .map(|path| path.display().to_string())
                        .collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for (index, path) in frames.iter().enumerate() {
                    println!("{index:>6}  {}", path.display());
                }
                eprintln!("{} frame(s)", frames.len());
            }
        }
        Commands::Check {
            source,
            width,
            height,
            json,
        } => {
            let frames = list_source(&source)?;
            let expected = width.zip(height);
            let report = if cli.global.progress {
                let progress = Arc::new(BarProgress::new(frames.len() as u64)?);
                let report =
                    stillreel::validate_frames_with_progress(&frames, expected, progress.clone());
                progress.bar.finish_and_clear();
                report
            } else {
                stillreel::validate_frames(&frames, expected)
            };
            if json {
                let payload = json!({
                    "valid": report.is_valid(),
                    "frames": frames.len(),
                    "dimensions": report.dimensions.map(|(w, h)| json!({ "width": w, "height": h })),
                    "info": report.info,
                    "warnings": report.warnings,
                    "errors": report.errors,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print!("{report}");
            }
            if !report.is_valid() {
                return Err(format!("{} problem(s) found", report.errors.len()).into());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "stillreel", &mut std::io::stdout());
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
