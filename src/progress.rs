//! Progress reporting and cancellation support.
//!
//! [`ProgressCallback`] observes a running job, [`CancellationToken`] stops
//! it cooperatively. The token is checked once before each frame; a frame
//! that has started decoding always runs to completion.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use stillreel::{
//!     EncodeJob, EncodeOptions, FrameSourceOptions, ProgressCallback, ProgressInfo,
//!     SequenceEncoder, StillreelError,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let frames = stillreel::list_frames("shots/", &FrameSourceOptions::new())?;
//! let job = EncodeJob::new("out.mp4", 1920, 1080).fps(24);
//! let options = EncodeOptions::new().with_progress(Arc::new(PrintProgress));
//! SequenceEncoder::new(job).encode_all_with_options(&frames, &options)?;
//! # Ok::<(), StillreelError>(())
//! ```

use std::path::PathBuf;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Decoding, converting, and submitting frames to the encoder.
    FrameEncoding,
    /// Probing frame headers before a job.
    Validation,
}

/// A snapshot of job progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// Frames processed so far.
    pub current: u64,
    /// Total frames expected, if known.
    pub total: Option<u64>,
    /// Completion percentage (0.0 - 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on throughput so far.
    pub estimated_remaining: Option<Duration>,
    /// Index of the frame just processed.
    pub current_frame: Option<u64>,
    /// Source image of the frame just processed.
    pub current_path: Option<PathBuf>,
}

/// Trait for receiving progress updates.
///
/// Implementations must be [`Send`] and [`Sync`] because callbacks may be
/// invoked from rayon workers.
///
/// Progress callbacks are **infallible**: they observe but cannot halt the
/// job. Use [`CancellationToken`] for that.
pub trait ProgressCallback: Send + Sync {
    /// Called every `batch_size` frames and once at the end.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clones share state; call [`cancel`](CancellationToken::cancel) from any
/// thread.
///
/// ```
/// use stillreel::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks timing and fires callbacks every `batch_size` items.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one completed frame.
    pub(crate) fn advance(&mut self, frame_index: u64, path: &std::path::Path) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report(Some(frame_index), Some(path.to_path_buf()));
            self.items_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final report.
    pub(crate) fn finish(&mut self) {
        self.report(None, None);
    }

    fn report(&self, frame_index: Option<u64>, path: Option<PathBuf>) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (self.current as f32 / total as f32) * 100.0);

        let estimated_remaining = if self.current > 0 {
            self.total.map(|total| {
                let remaining = total.saturating_sub(self.current);
                elapsed.mul_f64(remaining as f64 / self.current as f64)
            })
        } else {
            None
        };

        self.callback.on_progress(&ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_frame: frame_index,
            current_path: path,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(u64, Option<f32>)>>);

    impl ProgressCallback for Recorder {
        fn on_progress(&self, info: &ProgressInfo) {
            self.0.lock().unwrap().push((info.current, info.percentage));
        }
    }

    #[test]
    fn tracker_reports_every_batch() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker =
            ProgressTracker::new(recorder.clone(), OperationType::FrameEncoding, Some(4), 2);
        for index in 0..4 {
            tracker.advance(index, Path::new("f.png"));
        }
        tracker.finish();

        let reports = recorder.0.lock().unwrap();
        let counts: Vec<u64> = reports.iter().map(|(current, _)| *current).collect();
        assert_eq!(counts, vec![2, 4, 4]);
        assert_eq!(reports[1].1, Some(100.0));
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker = ProgressTracker::new(recorder.clone(), OperationType::Validation, None, 0);
        tracker.advance(0, Path::new("a.png"));
        assert_eq!(recorder.0.lock().unwrap().len(), 1);
        assert_eq!(recorder.0.lock().unwrap()[0].1, None);
    }
}
