//! Preflight checks for a frame list.
//!
//! [`validate_frames`] reads only the header of every frame and reports
//! problems that would abort an encode: unreadable or unrecognised files,
//! odd dimensions, and frames whose size differs from the rest.
//!
//! # Example
//!
//! ```no_run
//! use stillreel::FrameSourceOptions;
//!
//! let frames = stillreel::list_frames("shots/", &FrameSourceOptions::new())?;
//! let report = stillreel::validate_frames(&frames, None);
//! if report.is_valid() {
//!     println!("ready: {:?}", report.dimensions);
//! } else {
//!     print!("{report}");
//! }
//! # Ok::<(), stillreel::StillreelError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::decode;
use crate::frame_source::FramePaths;
use crate::progress::{NoOpProgress, OperationType, ProgressCallback, ProgressTracker};

/// Summary of a frame list's fitness for encoding.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Non-fatal issues.
    pub warnings: Vec<String>,
    /// Issues that will make an encode fail.
    pub errors: Vec<String>,
    /// The frame size every readable frame was checked against.
    pub dimensions: Option<(u32, u32)>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of entries (info + warnings + errors).
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Probe every frame header in `frames`.
///
/// Frames are compared against `expected` when given, otherwise against the
/// first readable frame.
pub fn validate_frames(frames: &FramePaths, expected: Option<(u32, u32)>) -> ValidationReport {
    validate_frames_with_progress(frames, expected, Arc::new(NoOpProgress))
}

/// Like [`validate_frames`], reporting each probed header to `progress`
/// as [`OperationType::Validation`].
pub fn validate_frames_with_progress(
    frames: &FramePaths,
    expected: Option<(u32, u32)>,
    progress: Arc<dyn ProgressCallback>,
) -> ValidationReport {
    let mut report = ValidationReport {
        dimensions: expected,
        ..ValidationReport::default()
    };

    if frames.is_empty() {
        report.errors.push("No frames found".to_string());
        return report;
    }

    let mut tracker = ProgressTracker::new(
        progress,
        OperationType::Validation,
        Some(frames.len() as u64),
        1,
    );
    let mut mismatched = 0_usize;
    for (index, path) in frames.iter().enumerate() {
        let probed = decode::probe_dimensions(path);
        tracker.advance(index as u64, path);
        let (width, height) = match probed {
            Ok(dimensions) => dimensions,
            Err(error) => {
                report.errors.push(format!("frame {index}: {error}"));
                continue;
            }
        };

        let reference = *report.dimensions.get_or_insert((width, height));
        if (width, height) != reference {
            mismatched += 1;
            report.errors.push(format!(
                "frame {index} ({}) is {width}x{height}, expected {}x{}",
                path.display(),
                reference.0,
                reference.1,
            ));
        }
    }

    if let Some((width, height)) = report.dimensions {
        if width % 2 != 0 || height % 2 != 0 {
            report.errors.push(format!(
                "frame size {width}x{height} is odd; 4:2:0 needs even dimensions"
            ));
        }
        if width > 8192 || height > 8192 {
            report.warnings.push(format!(
                "frame size {width}x{height} exceeds what most encoders accept"
            ));
        }
        report.info.push(format!(
            "{} frame(s) at {width}x{height}",
            frames.len()
        ));
    }

    if mismatched > 0 {
        report.info.push(format!(
            "{mismatched} frame(s) differ in size; encode with resampling to accept them"
        ));
    }

    tracker.finish();
    log::debug!(
        "Validated {} frame(s): {} error(s), {} warning(s)",
        frames.len(),
        report.errors.len(),
        report.warnings.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_invalid() {
        let report = validate_frames(&FramePaths::default(), None);
        assert!(!report.is_valid());
        assert!(report.to_string().contains("No frames found"));
    }

    #[test]
    fn display_lists_every_level() {
        let report = ValidationReport {
            info: vec!["a".into()],
            warnings: vec!["b".into()],
            errors: vec!["c".into()],
            dimensions: None,
        };
        let text = report.to_string();
        assert!(text.contains("[INFO] a"));
        assert!(text.contains("[WARN] b"));
        assert!(text.contains("[ERROR] c"));
        assert_eq!(report.issue_count(), 3);
    }
}
