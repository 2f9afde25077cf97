//! Progress and cancellation integration tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use image::{Rgb, RgbImage};
use stillreel::{
    CancellationToken, EncodeJob, EncodeOptions, FrameSink, OperationType, ProgressCallback,
    ProgressInfo, SequenceEncoder, StillreelError, YuvFrame,
};

// ── CancellationToken ──────────────────────────────────────────────

#[test]
fn cancellation_token_default_not_cancelled() {
    let token = CancellationToken::new();
    assert!(!token.is_cancelled());
}

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::default();
    let clone = token.clone();
    assert!(!clone.is_cancelled());

    token.cancel();
    assert!(clone.is_cancelled());
}

// ── Progress during a job ──────────────────────────────────────────

#[derive(Default)]
struct CountingSink {
    frames: u64,
    aborted: bool,
}

impl FrameSink for CountingSink {
    fn begin(&mut self, _job: &EncodeJob, _frame_count: u64) -> Result<(), StillreelError> {
        Ok(())
    }

    fn submit(&mut self, _frame: YuvFrame, _index: u64) -> Result<(), StillreelError> {
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), StillreelError> {
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

#[derive(Default)]
struct Recorder(Mutex<Vec<ProgressInfo>>);

impl ProgressCallback for Recorder {
    fn on_progress(&self, info: &ProgressInfo) {
        self.0.lock().unwrap().push(info.clone());
    }
}

fn frames(directory: &std::path::Path, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|index| {
            let path = directory.join(format!("{index:02}.png"));
            RgbImage::from_pixel(4, 4, Rgb([index as u8, 0, 0]))
                .save(&path)
                .expect("write fixture");
            path
        })
        .collect()
}

#[test]
fn batch_size_controls_report_frequency() {
    let directory = tempfile::tempdir().expect("temp dir");
    let paths = frames(directory.path(), 6);
    let recorder = Arc::new(Recorder::default());
    let options = EncodeOptions::new()
        .with_progress(recorder.clone())
        .with_batch_size(3);

    let mut sink = CountingSink::default();
    let submitted = SequenceEncoder::new(EncodeJob::new("unused.mp4", 4, 4))
        .encode_into(&paths, &mut sink, &options)
        .expect("encode");
    assert_eq!(submitted, 6);

    let reports = recorder.0.lock().unwrap();
    assert!(!reports.is_empty());
    assert!(reports.len() <= 3, "got {} reports", reports.len());
    let last = reports.last().unwrap();
    assert_eq!(last.operation, OperationType::FrameEncoding);
    assert_eq!(last.current, 6);
    assert_eq!(last.total, Some(6));
}

#[test]
fn cancelled_job_returns_error_and_aborts() {
    let directory = tempfile::tempdir().expect("temp dir");
    let paths = frames(directory.path(), 2);
    let token = CancellationToken::new();
    token.cancel();
    let options = EncodeOptions::new().with_cancellation(token);

    let mut sink = CountingSink::default();
    let result = SequenceEncoder::new(EncodeJob::new("unused.mp4", 4, 4))
        .encode_into(&paths, &mut sink, &options);
    assert!(matches!(result, Err(StillreelError::Cancelled)));
    assert_eq!(sink.frames, 0);
    assert!(sink.aborted);
}
