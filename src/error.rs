//! Error types for the `slide_extract` crate.
//!
//! This module defines [`SlideError`], the unified error type returned by all
//! fallible operations in the crate. Errors carry the path, region, or
//! upstream message needed to diagnose the failure.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

use crate::roi::Roi;

/// The unified error type for all `slide_extract` operations.
///
/// Configuration problems ([`InvalidRoiSyntax`](SlideError::InvalidRoiSyntax),
/// [`ThresholdOutOfRange`](SlideError::ThresholdOutOfRange)) are reported
/// before any decoding starts. [`EncodeFailure`](SlideError::EncodeFailure)
/// is the only per-frame error; the extraction loop recovers from it and
/// never returns it to the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SlideError {
    /// The input could not be opened as a decodable video.
    #[error("Failed to open video source at {path}: {reason}")]
    CannotOpenSource {
        /// Path that was passed to [`VideoSource::open`](crate::VideoSource::open).
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// A region string did not match `X.Y:WxH`, or described an empty area.
    #[error("Invalid region '{0}': expected X.Y:WxH with non-zero width and height")]
    InvalidRoiSyntax(String),

    /// The similarity threshold is outside `(0, 1]`.
    #[error("Threshold must be between 0 and 1 (got {0})")]
    ThresholdOutOfRange(f64),

    /// The selection window closed without a confirmed rectangle.
    #[error("No region selected")]
    NoRegionSelected,

    /// The comparison region does not fit inside the decoded frame.
    #[error("Region {roi} does not fit inside a {width}x{height} frame")]
    RoiOutOfBounds {
        /// The configured region.
        roi: Roi,
        /// Width of the decoded frame.
        width: u32,
        /// Height of the decoded frame.
        height: u32,
    },

    /// No export formats were configured.
    #[error("At least one export format is required")]
    EmptyExportPlan,

    /// A frame could not be written in the requested format.
    #[error("Failed to write image {path}: {reason}")]
    EncodeFailure {
        /// Output path that was attempted.
        path: PathBuf,
        /// Underlying reason the write failed.
        reason: String,
    },

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The preview window could not be created or driven.
    #[cfg(feature = "gui")]
    #[error("Preview window error: {0}")]
    Gui(String),
}

impl From<FfmpegError> for SlideError {
    fn from(error: FfmpegError) -> Self {
        SlideError::FfmpegError(error.to_string())
    }
}

#[cfg(feature = "gui")]
impl From<opencv::Error> for SlideError {
    fn from(error: opencv::Error) -> Self {
        SlideError::Gui(error.to_string())
    }
}
