//! Progress reporting and export notifications.
//!
//! This module provides [`ProgressCallback`] for observing an extraction run:
//! periodic [`ProgressInfo`] snapshots while frames are decoded, and an
//! [`ExportEvent`] for every slide file the engine tries to write.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use slide_extract::{ExportEvent, ExtractOptions, ProgressCallback, ProgressInfo, SlideError};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{} frames, {} slides", info.frames_processed, info.exported);
//!     }
//!
//!     fn on_export(&self, event: &ExportEvent) {
//!         if let ExportEvent::Written { path, .. } = event {
//!             println!("wrote {}", path.display());
//!         }
//!     }
//! }
//!
//! let options = ExtractOptions::new().with_progress(Arc::new(PrintProgress));
//! let summary = slide_extract::extract_slides("talk.mp4", "slides/talk_", &options)?;
//! # Ok::<(), SlideError>(())
//! ```

use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use crate::export::ExportFormat;

/// A snapshot of extraction progress.
///
/// Delivered to [`ProgressCallback::on_progress`] at a cadence controlled by
/// [`ExtractOptions::with_batch_size`](crate::ExtractOptions::with_batch_size).
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Frames decoded so far.
    pub frames_processed: u64,
    /// Total frames expected, if the container reports it.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Slides written so far.
    pub exported: u64,
    /// Slides that could not be written in any format.
    pub failed_exports: u64,
    /// Wall-clock time elapsed since the run started.
    pub elapsed: Duration,
    /// Presentation timestamp of the most recent frame.
    pub current_timestamp: Option<Duration>,
}

/// What happened to one candidate slide.
#[derive(Debug, Clone)]
pub enum ExportEvent {
    /// About to encode a frame.
    Attempt {
        /// Target path.
        path: PathBuf,
        /// Format being tried.
        format: ExportFormat,
        /// Frame width in pixels.
        width: u32,
        /// Frame height in pixels.
        height: u32,
    },
    /// The frame was written.
    Written {
        path: PathBuf,
        format: ExportFormat,
    },
    /// Encoding in `format` failed; the next format (if any) is tried.
    Failed {
        path: PathBuf,
        format: ExportFormat,
        reason: String,
    },
}

/// Trait for observing an extraction run.
///
/// Implementations must be [`Send`] and [`Sync`] so options can be shared.
/// Callbacks are infallible: they observe the run but cannot halt it.
pub trait ProgressCallback: Send + Sync {
    /// Called every `batch_size` decoded frames and once at the end.
    fn on_progress(&self, info: &ProgressInfo);

    /// Called for every encode attempt and its outcome.
    fn on_export(&self, _event: &ExportEvent) {}
}

/// A no-op implementation that discards all notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks run timing and fires progress callbacks at the batch cadence.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: Option<u64>,
    batch_size: u64,
    start_time: Instant,
    frames_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, total: Option<u64>, batch_size: u64) -> Self {
        Self {
            callback,
            total,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            frames_since_last_report: 0,
        }
    }

    pub(crate) fn export_event(&self, event: ExportEvent) {
        self.callback.on_export(&event);
    }

    /// Record one processed frame and report if the batch is full.
    pub(crate) fn advance(&mut self, counts: Counts, timestamp: Duration) {
        self.frames_since_last_report += 1;

        if self.frames_since_last_report >= self.batch_size {
            self.report(counts, Some(timestamp));
            self.frames_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final report.
    pub(crate) fn finish(&self, counts: Counts) {
        self.report(counts, None);
    }

    fn report(&self, counts: Counts, timestamp: Option<Duration>) {
        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (counts.frames_processed as f32 / total as f32 * 100.0).min(100.0));

        let info = ProgressInfo {
            frames_processed: counts.frames_processed,
            total: self.total,
            percentage,
            exported: counts.exported,
            failed_exports: counts.failed_exports,
            elapsed: self.start_time.elapsed(),
            current_timestamp: timestamp,
        };

        self.callback.on_progress(&info);
    }
}

/// Running counters shared between the engine and the tracker.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counts {
    pub(crate) frames_processed: u64,
    pub(crate) exported: u64,
    pub(crate) failed_exports: u64,
}
