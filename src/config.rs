//! Extraction configuration.
//!
//! [`ExtractOptions`] is a builder that threads the comparison region,
//! similarity threshold, export plan, and progress callback through an
//! extraction run without widening every function signature.
//!
//! # Example
//!
//! ```
//! use slide_extract::{ExportFormat, ExtractOptions, Roi};
//!
//! let options = ExtractOptions::new()
//!     .with_threshold(0.995)
//!     .with_roi(Roi::new(0, 0, 120, 40)?)
//!     .with_export_formats(vec![ExportFormat::Jpeg { quality: 90 }]);
//! options.validate()?;
//! # Ok::<(), slide_extract::SlideError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::{
    error::SlideError,
    export::ExportFormat,
    progress::{NoOpProgress, ProgressCallback},
    roi::Roi,
};

/// Similarity at or below which a frame counts as a new slide.
pub const DEFAULT_THRESHOLD: f64 = 0.999;

/// Check that `threshold` lies in `(0, 1]`.
///
/// # Errors
///
/// Returns [`SlideError::ThresholdOutOfRange`] otherwise (including NaN).
pub fn validate_threshold(threshold: f64) -> Result<f64, SlideError> {
    if threshold > 0.0 && threshold <= 1.0 {
        Ok(threshold)
    } else {
        Err(SlideError::ThresholdOutOfRange(threshold))
    }
}

/// Configuration for an extraction run.
///
/// A default-constructed value compares full frames at
/// [`DEFAULT_THRESHOLD`], writes PNG with a JPEG fallback, and reports no
/// progress.
#[derive(Clone)]
pub struct ExtractOptions {
    pub(crate) threshold: f64,
    pub(crate) roi: Option<Roi>,
    pub(crate) export_formats: Vec<ExportFormat>,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// How often to fire the progress callback (every N decoded frames).
    pub(crate) batch_size: u64,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("threshold", &self.threshold)
            .field("roi", &self.roi)
            .field("export_formats", &self.export_formats)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            roi: None,
            export_formats: ExportFormat::default_plan(),
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Set the similarity threshold. Checked by [`validate`](Self::validate).
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Restrict comparison to `roi`. Exported images stay full-frame.
    #[must_use]
    pub fn with_roi(mut self, roi: Roi) -> Self {
        self.roi = Some(roi);
        self
    }

    /// Compare full frames again.
    #[must_use]
    pub fn without_roi(mut self) -> Self {
        self.roi = None;
        self
    }

    /// Replace the ordered list of formats tried for each slide.
    #[must_use]
    pub fn with_export_formats(mut self, formats: Vec<ExportFormat>) -> Self {
        self.export_formats = formats;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn roi(&self) -> Option<Roi> {
        self.roi
    }

    pub fn export_formats(&self) -> &[ExportFormat] {
        &self.export_formats
    }

    /// Check the options before any decoding starts.
    ///
    /// # Errors
    ///
    /// - [`SlideError::ThresholdOutOfRange`] if the threshold is not in `(0, 1]`.
    /// - [`SlideError::EmptyExportPlan`] if no export format is configured.
    pub fn validate(&self) -> Result<(), SlideError> {
        validate_threshold(self.threshold)?;
        if self.export_formats.is_empty() {
            return Err(SlideError::EmptyExportPlan);
        }
        Ok(())
    }
}
