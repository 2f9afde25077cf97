//! Frame sequencing: the decode → convert → submit loop.
//!
//! [`SequenceEncoder`] walks an ordered list of image paths and, for each
//! one, decodes it, checks its size against the [`EncodeJob`], converts it
//! to YUV 4:2:0, and hands it to a [`FrameSink`]. Every frame is released
//! before the next one is read.
//!
//! The loop is fail-fast. The first frame that cannot be decoded, sized, or
//! submitted aborts the job with [`StillreelError::FrameFailed`], whose
//! `frames_submitted` counts exactly the frames delivered before it, and
//! the sink is told to discard its partial output.
//!
//! # Example
//!
//! ```no_run
//! use stillreel::{EncodeJob, FrameSourceOptions, SequenceEncoder, StillreelError};
//!
//! let frames = stillreel::list_frames("shots/", &FrameSourceOptions::new())?;
//! let job = EncodeJob::new("out.mp4", 3840, 2160).fps(10).bitrate(4_000_000);
//! let submitted = SequenceEncoder::new(job).encode_all(&frames)?;
//! println!("{submitted} frames encoded");
//! # Ok::<(), StillreelError>(())
//! ```

use std::path::{Path, PathBuf};

use image::imageops;

use crate::config::{DimensionPolicy, EncodeOptions};
use crate::conversion::{self, YuvFrame};
use crate::decode::{self, DecodedImage};
use crate::encode::{FfmpegSink, FrameSink};
use crate::error::StillreelError;
use crate::frame_source::FramePaths;
use crate::job::EncodeJob;
use crate::progress::{OperationType, ProgressTracker};

/// Drives a list of frames through decode, conversion, and a sink.
#[derive(Debug, Clone)]
pub struct SequenceEncoder {
    job: EncodeJob,
}

impl SequenceEncoder {
    /// Create an encoder for `job`.
    pub fn new(job: EncodeJob) -> Self {
        Self { job }
    }

    /// The job this encoder runs.
    pub fn job(&self) -> &EncodeJob {
        &self.job
    }

    /// Encode `frames` into the job's output file with FFmpeg.
    ///
    /// Returns the number of frames submitted.
    pub fn encode_all(&self, frames: &FramePaths) -> Result<u64, StillreelError> {
        self.encode_all_with_options(frames, &EncodeOptions::default())
    }

    /// Like [`encode_all`](SequenceEncoder::encode_all) with progress,
    /// cancellation, and dimension policy settings.
    pub fn encode_all_with_options(
        &self,
        frames: &FramePaths,
        options: &EncodeOptions,
    ) -> Result<u64, StillreelError> {
        let mut sink = FfmpegSink::new();
        self.encode_into(frames.as_slice(), &mut sink, options)
    }

    /// Encode `paths` into an arbitrary sink.
    ///
    /// # Errors
    ///
    /// - [`StillreelError::InvalidJob`] / [`StillreelError::OddDimensions`]
    ///   if the job is unusable; the sink is not touched.
    /// - [`StillreelError::NoFrames`] if there is nothing to encode.
    /// - [`StillreelError::Cancelled`] if the token fires between frames.
    /// - [`StillreelError::FrameFailed`] wrapping the first per-frame error.
    /// - Any error from [`FrameSink::begin`] or [`FrameSink::finish`].
    pub fn encode_into<S: FrameSink + ?Sized>(
        &self,
        paths: &[PathBuf],
        sink: &mut S,
        options: &EncodeOptions,
    ) -> Result<u64, StillreelError> {
        let paths = self.planned(paths)?;
        let mut run = Run::begin(&self.job, paths.len() as u64, sink, options)?;

        for (index, path) in paths.iter().enumerate() {
            if options.is_cancelled() {
                return Err(run.cancel());
            }
            let prepared = prepare_frame(path, &self.job, options);
            run.deliver(index as u64, path, prepared)?;
        }

        run.finish()
    }

    /// Encode `paths` with decode and conversion spread over rayon threads.
    ///
    /// Frames are prepared a window at a time and always submitted in index
    /// order, so the output is identical to
    /// [`encode_into`](SequenceEncoder::encode_into). Failure accounting is
    /// the same: frames after the first failure are never submitted. The
    /// cancellation token is checked before each submission.
    #[cfg(feature = "rayon")]
    pub fn encode_into_parallel<S: FrameSink + ?Sized>(
        &self,
        paths: &[PathBuf],
        sink: &mut S,
        options: &EncodeOptions,
    ) -> Result<u64, StillreelError> {
        let paths = self.planned(paths)?;
        let run = Run::begin(&self.job, paths.len() as u64, sink, options)?;
        crate::rayon::encode_windows(run, paths, &self.job, options)
    }

    /// Validate the job and apply its frame-count limit.
    fn planned<'p>(&self, paths: &'p [PathBuf]) -> Result<&'p [PathBuf], StillreelError> {
        self.job.validate()?;
        let limit = self
            .job
            .frame_count
            .map_or(paths.len(), |count| paths.len().min(count as usize));
        let paths = &paths[..limit];
        if paths.is_empty() {
            return Err(StillreelError::NoFrames);
        }
        Ok(paths)
    }
}

/// Decode, size-check, and convert one frame.
pub(crate) fn prepare_frame(
    path: &Path,
    job: &EncodeJob,
    options: &EncodeOptions,
) -> Result<YuvFrame, StillreelError> {
    let image = decode::decode_with_limit(path, options.max_decode_alloc)?;
    let image = fit_to_job(image, path, job, options.dimension_policy)?;
    conversion::to_yuv420(&image)
}

fn fit_to_job(
    image: DecodedImage,
    path: &Path,
    job: &EncodeJob,
    policy: DimensionPolicy,
) -> Result<DecodedImage, StillreelError> {
    let (width, height) = image.dimensions();
    if (width, height) == (job.width, job.height) {
        return Ok(image);
    }
    match policy {
        DimensionPolicy::Reject => Err(StillreelError::DimensionMismatch {
            path: path.to_path_buf(),
            expected_width: job.width,
            expected_height: job.height,
            actual_width: width,
            actual_height: height,
        }),
        DimensionPolicy::Resample(filter) => {
            log::debug!(
                "Resampling {} from {width}x{height} to {}x{}",
                path.display(),
                job.width,
                job.height
            );
            let source = image.into_rgb_image()?;
            Ok(imageops::resize(&source, job.width, job.height, filter).into())
        }
    }
}

/// Bookkeeping for one job in flight: the sink, progress, and the count of
/// frames delivered so far.
pub(crate) struct Run<'a, S: FrameSink + ?Sized> {
    sink: &'a mut S,
    tracker: ProgressTracker,
    submitted: u64,
}

impl<'a, S: FrameSink + ?Sized> Run<'a, S> {
    pub(crate) fn begin(
        job: &EncodeJob,
        frame_count: u64,
        sink: &'a mut S,
        options: &EncodeOptions,
    ) -> Result<Self, StillreelError> {
        sink.begin(job, frame_count)?;
        Ok(Self {
            sink,
            tracker: ProgressTracker::new(
                options.progress.clone(),
                OperationType::FrameEncoding,
                Some(frame_count),
                options.batch_size,
            ),
            submitted: 0,
        })
    }

    /// Submit a prepared frame, or abort the job with its error.
    pub(crate) fn deliver(
        &mut self,
        index: u64,
        path: &Path,
        prepared: Result<YuvFrame, StillreelError>,
    ) -> Result<(), StillreelError> {
        let result = prepared.and_then(|frame| self.sink.submit(frame, index));
        if let Err(error) = result {
            log::error!("Frame {index} ({}) failed: {error}", path.display());
            self.sink.abort();
            return Err(error.at_frame(index, path, self.submitted));
        }
        log::debug!("Submitted frame {index} ({})", path.display());
        self.submitted += 1;
        self.tracker.advance(index, path);
        Ok(())
    }

    pub(crate) fn cancel(&mut self) -> StillreelError {
        log::info!("Cancelled after {} frame(s)", self.submitted);
        self.sink.abort();
        StillreelError::Cancelled
    }

    pub(crate) fn finish(mut self) -> Result<u64, StillreelError> {
        if let Err(error) = self.sink.finish() {
            self.sink.abort();
            return Err(error);
        }
        self.tracker.finish();
        log::info!("Encoded {} frame(s)", self.submitted);
        Ok(self.submitted)
    }
}
