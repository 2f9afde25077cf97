//! Error types for the `stillreel` crate.
//!
//! This module defines [`StillreelError`], the unified error type returned by
//! every fallible operation in the crate. Variants carry the path, frame
//! index, and dimensions involved so a failed job can be diagnosed from the
//! error alone.

use std::path::PathBuf;

use ffmpeg_next::Error as FfmpegError;
use thiserror::Error;

/// The unified error type for all `stillreel` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StillreelError {
    /// The frame directory could not be opened or enumerated.
    #[error("Failed to read frame directory {path}: {reason}")]
    DirectoryUnreadable {
        /// Directory passed to [`crate::list_frames`].
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// The directory holds more frames than the configured capacity and the
    /// overflow policy is [`OverflowPolicy::Error`](crate::OverflowPolicy::Error).
    #[error("Frame directory {path} exceeds the capacity of {capacity} frames")]
    CapacityExceeded {
        /// Directory being listed.
        path: PathBuf,
        /// Configured maximum frame count.
        capacity: usize,
    },

    /// An image file does not exist.
    #[error("Image file not found: {0}")]
    FileNotFound(PathBuf),

    /// An image file exists but could not be opened or read.
    #[error("Failed to read image file {path}: {reason}")]
    FileUnreadable {
        /// Image path.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// The image format was not recognised, or its header or body is
    /// truncated or corrupt.
    #[error("Malformed image {path}: {reason}")]
    MalformedImageHeader {
        /// Image path.
        path: PathBuf,
        /// Decoder message.
        reason: String,
    },

    /// A pixel buffer could not be allocated.
    #[error("Out of memory allocating {bytes} bytes ({context})")]
    OutOfMemory {
        /// Requested allocation size, if known.
        bytes: u64,
        /// What the buffer was for.
        context: String,
    },

    /// A raw pixel buffer does not have the length its dimensions imply.
    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    InvalidBuffer {
        /// Length implied by the dimensions.
        expected: usize,
        /// Length supplied.
        actual: usize,
    },

    /// 4:2:0 subsampling needs even width and height.
    #[error("Dimensions {width}x{height} are not even; 4:2:0 chroma needs 2x2 blocks")]
    OddDimensions {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },

    /// A decoded frame does not match the job's configured size.
    #[error(
        "Frame {path} is {actual_width}x{actual_height}, job expects {expected_width}x{expected_height}"
    )]
    DimensionMismatch {
        /// Image path.
        path: PathBuf,
        /// Configured job width.
        expected_width: u32,
        /// Configured job height.
        expected_height: u32,
        /// Decoded width.
        actual_width: u32,
        /// Decoded height.
        actual_height: u32,
    },

    /// The encode job settings are unusable.
    #[error("Invalid encode job: {0}")]
    InvalidJob(String),

    /// The frame list is empty.
    #[error("No frames to encode")]
    NoFrames,

    /// The encoder or output container could not be set up.
    #[error("Encoder setup failed: {0}")]
    EncoderSetupFailed(String),

    /// The encoder rejected a frame, or packets could not be written.
    #[error("Encoder submission failed: {0}")]
    EncoderSubmissionFailed(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// The job was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// A frame failed and the job was aborted.
    ///
    /// `frames_submitted` is the number of frames delivered to the sink
    /// before `frame_index`; the failing frame itself was never submitted.
    #[error("Frame {frame_index} ({path}) failed after {frames_submitted} submitted frame(s): {source}")]
    FrameFailed {
        /// Zero-based index of the failing frame.
        frame_index: u64,
        /// Path of the failing frame.
        path: PathBuf,
        /// Frames successfully submitted before the failure.
        frames_submitted: u64,
        /// What went wrong.
        #[source]
        source: Box<StillreelError>,
    },
}

impl StillreelError {
    /// The underlying error, looking through [`StillreelError::FrameFailed`].
    pub fn root_cause(&self) -> &StillreelError {
        match self {
            StillreelError::FrameFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Wrap `self` with the failing frame's position in the job.
    pub(crate) fn at_frame(
        self,
        frame_index: u64,
        path: impl Into<PathBuf>,
        frames_submitted: u64,
    ) -> Self {
        StillreelError::FrameFailed {
            frame_index,
            path: path.into(),
            frames_submitted,
            source: Box::new(self),
        }
    }
}

impl From<FfmpegError> for StillreelError {
    fn from(error: FfmpegError) -> Self {
        StillreelError::FfmpegError(error.to_string())
    }
}
