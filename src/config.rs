//! Encoding options.
//!
//! [`EncodeOptions`] is a builder that threads progress callbacks,
//! cancellation, and per-frame policies through a job without widening every
//! function signature.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use stillreel::{CancellationToken, DimensionPolicy, EncodeOptions, ProgressCallback, ProgressInfo};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{:?}: {} done", info.operation, info.current);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = EncodeOptions::new()
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_dimension_policy(DimensionPolicy::Reject)
//!     .with_batch_size(10);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use image::imageops::FilterType;

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// What to do with a frame whose size differs from the job's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DimensionPolicy {
    /// Fail the job with [`StillreelError::DimensionMismatch`](crate::StillreelError::DimensionMismatch).
    #[default]
    Reject,
    /// Resize the frame to the job size with the given filter.
    Resample(FilterType),
}

/// Operational settings for a job.
#[derive(Clone)]
pub struct EncodeOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
    pub(crate) dimension_policy: DimensionPolicy,
    pub(crate) max_decode_alloc: Option<u64>,
}

impl Debug for EncodeOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("EncodeOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("dimension_policy", &self.dimension_policy)
            .field("max_decode_alloc", &self.max_decode_alloc)
            .finish()
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodeOptions {
    /// No progress callback, no cancellation, batch size 1, reject
    /// mismatched frames, default decoder limits.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            dimension_policy: DimensionPolicy::Reject,
            max_decode_alloc: None,
        }
    }

    /// Attach a progress callback, fired every
    /// [`batch_size`](EncodeOptions::with_batch_size) frames.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token, checked before each frame.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Fire progress every `size` frames. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Choose how frames of the wrong size are handled.
    #[must_use]
    pub fn with_dimension_policy(mut self, policy: DimensionPolicy) -> Self {
        self.dimension_policy = policy;
        self
    }

    /// Cap the bytes the image decoder may allocate per frame.
    #[must_use]
    pub fn with_max_decode_alloc(mut self, bytes: u64) -> Self {
        self.max_decode_alloc = Some(bytes);
        self
    }

    /// The configured dimension policy.
    pub fn dimension_policy(&self) -> DimensionPolicy {
        self.dimension_policy
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let token = CancellationToken::new();
        let options = EncodeOptions::new()
            .with_cancellation(token.clone())
            .with_batch_size(0)
            .with_dimension_policy(DimensionPolicy::Resample(FilterType::Triangle))
            .with_max_decode_alloc(1 << 20);

        assert_eq!(options.batch_size, 1);
        assert_eq!(
            options.dimension_policy(),
            DimensionPolicy::Resample(FilterType::Triangle)
        );
        assert_eq!(options.max_decode_alloc, Some(1 << 20));
        assert!(!options.is_cancelled());
        token.cancel();
        assert!(options.is_cancelled());
    }
}
