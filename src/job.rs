//! Encode job description.
//!
//! An [`EncodeJob`] fixes everything about one output video: where it goes,
//! its frame size, frame rate, bitrate, and codec. It does not change while
//! the job runs.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ffmpeg_next::codec::Id;

use crate::error::StillreelError;

/// Supported output video codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoCodec {
    /// MPEG-1 video. Only accepts the standard MPEG frame rates.
    Mpeg1,
    /// MPEG-2 video.
    Mpeg2,
    /// MPEG-4 Part 2. Built into every FFmpeg, accepts any frame rate.
    #[default]
    Mpeg4,
    /// H.264 / AVC.
    H264,
    /// H.265 / HEVC.
    H265,
}

impl VideoCodec {
    pub(crate) fn to_codec_id(self) -> Id {
        match self {
            VideoCodec::Mpeg1 => Id::MPEG1VIDEO,
            VideoCodec::Mpeg2 => Id::MPEG2VIDEO,
            VideoCodec::Mpeg4 => Id::MPEG4,
            VideoCodec::H264 => Id::H264,
            VideoCodec::H265 => Id::HEVC,
        }
    }
}

impl FromStr for VideoCodec {
    type Err = StillreelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "mpeg1" | "mpeg1video" => Ok(VideoCodec::Mpeg1),
            "mpeg2" | "mpeg2video" => Ok(VideoCodec::Mpeg2),
            "mpeg4" => Ok(VideoCodec::Mpeg4),
            "h264" | "avc" => Ok(VideoCodec::H264),
            "h265" | "hevc" => Ok(VideoCodec::H265),
            other => Err(StillreelError::InvalidJob(format!(
                "unsupported codec: {other}"
            ))),
        }
    }
}

impl Display for VideoCodec {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            VideoCodec::Mpeg1 => "mpeg1",
            VideoCodec::Mpeg2 => "mpeg2",
            VideoCodec::Mpeg4 => "mpeg4",
            VideoCodec::H264 => "h264",
            VideoCodec::H265 => "h265",
        };
        f.write_str(name)
    }
}

/// One encoding run: output path, frame geometry, and rate settings.
///
/// # Example
///
/// ```
/// use stillreel::{EncodeJob, VideoCodec};
///
/// let job = EncodeJob::new("out.mp4", 64, 64)
///     .fps(10)
///     .bitrate(4_000_000)
///     .codec(VideoCodec::Mpeg4);
/// assert!(job.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeJob {
    /// Output file. The container format follows the extension.
    pub output: PathBuf,
    /// Frame width in pixels. Must be even.
    pub width: u32,
    /// Frame height in pixels. Must be even.
    pub height: u32,
    /// Frames per second (default: 10).
    pub fps: u32,
    /// Encode at most this many frames. `None` encodes every listed frame.
    pub frame_count: Option<u64>,
    /// Target bitrate in bits per second (default: 4 000 000).
    pub bitrate: usize,
    /// Output codec.
    pub codec: VideoCodec,
}

impl EncodeJob {
    /// A job writing `width` x `height` frames to `output`.
    pub fn new<P: AsRef<Path>>(output: P, width: u32, height: u32) -> Self {
        Self {
            output: output.as_ref().to_path_buf(),
            width,
            height,
            fps: 10,
            frame_count: None,
            bitrate: 4_000_000,
            codec: VideoCodec::default(),
        }
    }

    /// Set the frame rate.
    #[must_use]
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Limit the number of frames encoded.
    #[must_use]
    pub fn frame_count(mut self, frame_count: u64) -> Self {
        self.frame_count = Some(frame_count);
        self
    }

    /// Set the target bitrate in bits per second.
    #[must_use]
    pub fn bitrate(mut self, bitrate: usize) -> Self {
        self.bitrate = bitrate;
        self
    }

    /// Set the codec.
    #[must_use]
    pub fn codec(mut self, codec: VideoCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Check the settings before any file is touched.
    ///
    /// # Errors
    ///
    /// - [`StillreelError::InvalidJob`] for a zero dimension, frame rate,
    ///   or bitrate.
    /// - [`StillreelError::OddDimensions`] if width or height is odd.
    pub fn validate(&self) -> Result<(), StillreelError> {
        if self.width == 0 || self.height == 0 {
            return Err(StillreelError::InvalidJob(format!(
                "frame size {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(StillreelError::OddDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.fps == 0 || self.fps > i32::MAX as u32 {
            return Err(StillreelError::InvalidJob(format!(
                "frame rate {} is out of range",
                self.fps
            )));
        }
        if self.bitrate == 0 {
            return Err(StillreelError::InvalidJob(
                "bitrate must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
