//! The slide extraction loop.
//!
//! Frames are read one at a time and compared against the last slide that
//! was actually written. A frame becomes a new slide when it is the first
//! frame of the stream, or when its similarity to the last slide is at or
//! below the configured threshold. Only a successful write moves the
//! comparison baseline forward; a frame that fails in every export format is
//! dropped and later frames keep being compared against the previous slide.
//!
//! # Example
//!
//! ```no_run
//! use slide_extract::{ExtractOptions, Roi};
//!
//! let options = ExtractOptions::new().with_roi(Roi::new(1180, 680, 80, 30)?);
//! let summary = slide_extract::extract_slides("lecture.mp4", "out/lecture_", &options)?;
//! println!("{} slides", summary.exported);
//! # Ok::<(), slide_extract::SlideError>(())
//! ```

use std::path::Path;

use crate::{
    config::ExtractOptions,
    error::SlideError,
    export::{DiskEncoder, FrameEncoder, export_frame},
    frame::Frame,
    progress::{Counts, ProgressTracker},
    similarity::similarity,
    source::{FrameSource, VideoSource},
};

/// Outcome of an extraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// Frames decoded from the source.
    pub frames_processed: u64,
    /// Slides written to disk. Equals the number of files created.
    pub exported: u64,
    /// Candidate slides dropped because every export format failed.
    pub failed_exports: u64,
}

/// Extract slides from the video at `source` into files named
/// `{output_prefix}HH_MM_SS_mmm.png`.
///
/// # Errors
///
/// - [`SlideError::ThresholdOutOfRange`] / [`SlideError::EmptyExportPlan`]
///   for invalid options, before the video is opened.
/// - [`SlideError::CannotOpenSource`] if the video cannot be opened.
/// - [`SlideError::RoiOutOfBounds`] if the region does not fit the frames.
/// - Decode errors from the source.
///
/// Encode failures are never returned; they are counted in
/// [`ExtractionSummary::failed_exports`].
pub fn extract_slides<P: AsRef<Path>>(
    source: P,
    output_prefix: &str,
    options: &ExtractOptions,
) -> Result<ExtractionSummary, SlideError> {
    options.validate()?;
    let mut video = VideoSource::open(source)?;
    extract_from_source(&mut video, &DiskEncoder, output_prefix, options)
}

/// Run the extraction loop over any frame source and encoder.
///
/// See [`extract_slides`] for the error contract.
pub fn extract_from_source<S, E>(
    source: &mut S,
    encoder: &E,
    output_prefix: &str,
    options: &ExtractOptions,
) -> Result<ExtractionSummary, SlideError>
where
    S: FrameSource + ?Sized,
    E: FrameEncoder + ?Sized,
{
    options.validate()?;

    log::debug!(
        "Extracting slides (prefix={output_prefix}, threshold={}, roi={:?})",
        options.threshold,
        options.roi,
    );

    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        source.frame_count_hint(),
        options.batch_size,
    );
    let mut counts = Counts::default();
    let mut last_exported: Option<Frame> = None;

    while let Some(frame) = source.read_frame()? {
        counts.frames_processed += 1;

        if let Some(roi) = options.roi
            && !roi.fits_within(frame.width(), frame.height())
        {
            return Err(SlideError::RoiOutOfBounds {
                roi,
                width: frame.width(),
                height: frame.height(),
            });
        }

        let is_new_slide = match &last_exported {
            None => true,
            Some(previous) => {
                similarity(previous.image(), frame.image(), options.roi)? <= options.threshold
            }
        };

        if is_new_slide {
            match export_frame(encoder, frame, output_prefix, &options.export_formats, &tracker) {
                Ok(_) => {
                    last_exported = Some(frame.duplicate());
                    counts.exported += 1;
                }
                Err(error) => {
                    log::warn!(
                        "Dropping slide at {:?}: every export format failed ({error})",
                        frame.timestamp()
                    );
                    counts.failed_exports += 1;
                }
            }
        }

        tracker.advance(counts, frame.timestamp());
    }

    tracker.finish(counts);

    log::debug!(
        "Extraction finished: {} frames, {} slides, {} dropped",
        counts.frames_processed,
        counts.exported,
        counts.failed_exports,
    );

    Ok(ExtractionSummary {
        frames_processed: counts.frames_processed,
        exported: counts.exported,
        failed_exports: counts.failed_exports,
    })
}
