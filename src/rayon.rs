//! Parallel frame preparation.
//!
//! Decoding and conversion are independent per frame, so a window of frames
//! is prepared across rayon threads while submission to the sink stays
//! strictly sequential. Results of each window are collected in index order
//! before any of them is delivered.
//!
//! The public API is [`SequenceEncoder::encode_into_parallel`](crate::SequenceEncoder);
//! this module only holds the implementation.

use std::path::PathBuf;

use ::rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::config::EncodeOptions;
use crate::conversion::YuvFrame;
use crate::encode::FrameSink;
use crate::error::StillreelError;
use crate::job::EncodeJob;
use crate::sequencer::{Run, prepare_frame};

/// Prepare `paths` a window at a time and deliver each window in order.
///
/// The window is one frame per rayon thread, which bounds peak memory to
/// that many decoded frames.
pub(crate) fn encode_windows<S: FrameSink + ?Sized>(
    mut run: Run<'_, S>,
    paths: &[PathBuf],
    job: &EncodeJob,
    options: &EncodeOptions,
) -> Result<u64, StillreelError> {
    let window = ::rayon::current_num_threads().max(1);
    log::debug!("Preparing frames in windows of {window}");

    for (window_index, chunk) in paths.chunks(window).enumerate() {
        if options.is_cancelled() {
            return Err(run.cancel());
        }

        let prepared: Vec<Result<YuvFrame, StillreelError>> = chunk
            .par_iter()
            .map(|path| prepare_frame(path, job, options))
            .collect();

        let base = (window_index * window) as u64;
        for (offset, (path, frame)) in chunk.iter().zip(prepared).enumerate() {
            // Prepared frames after a cancellation are dropped unsubmitted.
            if options.is_cancelled() {
                return Err(run.cancel());
            }
            run.deliver(base + offset as u64, path, frame)?;
        }
    }

    run.finish()
}
