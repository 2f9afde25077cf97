//! # stillreel
//!
//! Turn a directory of still images into a video.
//!
//! `stillreel` lists the images of a directory in file-name order, decodes
//! each one to interleaved RGB with the [`image`] crate, converts it to
//! planar YUV 4:2:0, and hands the frames one at a time to an encoder
//! sink. The bundled sink encodes with FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use stillreel::{EncodeJob, FrameSourceOptions, SequenceEncoder};
//!
//! let frames = stillreel::list_frames("shots/", &FrameSourceOptions::new()).unwrap();
//! let job = EncodeJob::new("out.mp4", 1920, 1080).fps(10).bitrate(4_000_000);
//! let submitted = SequenceEncoder::new(job).encode_all(&frames).unwrap();
//! println!("encoded {submitted} frames");
//! ```
//!
//! ### Converting a Single Frame
//!
//! ```no_run
//! let image = stillreel::decode("shots/0001.jpg").unwrap();
//! let frame = stillreel::to_yuv420(&image).unwrap();
//! assert_eq!(frame.len(), (image.width() * image.height() * 3 / 2) as usize);
//! ```
//!
//! ## Behaviour
//!
//! - **Ordering**: frames are sorted lexicographically by file name;
//!   subdirectories are skipped.
//! - **Sizing**: every frame must match the job's size unless
//!   [`DimensionPolicy::Resample`] is chosen. Odd sizes are rejected.
//! - **Fail-fast**: the first bad frame aborts the job, reports its index
//!   and path, and the partial output file is removed.
//! - **Cancellation**: a [`CancellationToken`] is checked between frames.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | `encode_into_parallel()` decodes and converts on rayon threads, submitting in order |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod config;
pub mod conversion;
pub mod decode;
pub mod encode;
pub mod error;
pub mod ffmpeg;
pub mod frame_source;
pub mod job;
pub mod progress;
#[cfg(feature = "rayon")]
mod rayon;
pub mod sequencer;
pub mod validation;

pub use config::{DimensionPolicy, EncodeOptions};
pub use conversion::{YuvFrame, to_yuv420, yuv420_len};
pub use decode::{DecodedImage, decode, decode_with_limit, probe_dimensions};
pub use encode::{FfmpegSink, FrameSink};
pub use error::StillreelError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use frame_source::{FramePaths, FrameSourceOptions, OverflowPolicy, list_frames};
pub use job::{EncodeJob, VideoCodec};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use sequencer::SequenceEncoder;
pub use validation::{ValidationReport, validate_frames, validate_frames_with_progress};
