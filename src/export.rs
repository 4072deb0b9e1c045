//! Writing slides to disk.
//!
//! Each candidate slide is written by trying an ordered list of
//! [`ExportFormat`]s until one succeeds. The default plan is PNG at maximum
//! compression, then JPEG at quality 95 under the same stem.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use image::{
    RgbImage,
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType, PngEncoder},
    },
};

use crate::{
    error::SlideError,
    frame::{Frame, slide_path},
    progress::{ExportEvent, ProgressTracker},
};

/// Quality used for the JPEG fallback.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// An output image format together with its encoder setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Lossless PNG at maximum compression.
    Png,
    /// JPEG with the given quality (1–100).
    Jpeg {
        /// Encoder quality.
        quality: u8,
    },
}

impl ExportFormat {
    /// File extension written for this format.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg { .. } => "jpg",
        }
    }

    /// The default plan: PNG, then JPEG at [`DEFAULT_JPEG_QUALITY`].
    pub fn default_plan() -> Vec<ExportFormat> {
        vec![
            ExportFormat::Png,
            ExportFormat::Jpeg {
                quality: DEFAULT_JPEG_QUALITY,
            },
        ]
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ExportFormat::Png => write!(f, "PNG"),
            ExportFormat::Jpeg { quality } => write!(f, "JPEG (quality {quality})"),
        }
    }
}

/// Something that can encode a frame into a file.
///
/// [`DiskEncoder`] is the real implementation. The seam exists so the
/// extraction loop can be driven with encoders that fail on demand.
pub trait FrameEncoder {
    /// Encode `image` to `path` in `format`.
    ///
    /// # Errors
    ///
    /// Returns [`SlideError::EncodeFailure`] if the file cannot be written.
    fn encode(&self, image: &RgbImage, path: &Path, format: ExportFormat) -> Result<(), SlideError>;
}

/// Encodes frames with the `image` crate and writes them to the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskEncoder;

impl FrameEncoder for DiskEncoder {
    fn encode(&self, image: &RgbImage, path: &Path, format: ExportFormat) -> Result<(), SlideError> {
        let failure = |reason: String| SlideError::EncodeFailure {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::create(path).map_err(|error| failure(error.to_string()))?;
        let mut writer = BufWriter::new(file);

        let encoded = match format {
            ExportFormat::Png => image.write_with_encoder(PngEncoder::new_with_quality(
                &mut writer,
                CompressionType::Best,
                FilterType::Adaptive,
            )),
            ExportFormat::Jpeg { quality } => {
                image.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, quality))
            }
        }
        .map_err(|error| error.to_string())
        .and_then(|()| writer.flush().map_err(|error| error.to_string()));

        if let Err(reason) = encoded {
            // Leave no truncated file behind for a failed format.
            drop(writer);
            let _ = fs::remove_file(path);
            return Err(failure(reason));
        }

        Ok(())
    }
}

/// Write `frame` using the first format in `plan` that succeeds.
///
/// Returns the written path, or the last encode error if every format
/// failed.
pub(crate) fn export_frame<E: FrameEncoder + ?Sized>(
    encoder: &E,
    frame: &Frame,
    prefix: &str,
    plan: &[ExportFormat],
    tracker: &ProgressTracker,
) -> Result<PathBuf, SlideError> {
    let mut last_error = SlideError::EmptyExportPlan;

    for &format in plan {
        let path = slide_path(prefix, frame.timestamp(), format.extension());
        tracker.export_event(ExportEvent::Attempt {
            path: path.clone(),
            format,
            width: frame.width(),
            height: frame.height(),
        });

        match encoder.encode(frame.image(), &path, format) {
            Ok(()) => {
                log::info!("Wrote {format} slide {}", path.display());
                tracker.export_event(ExportEvent::Written {
                    path: path.clone(),
                    format,
                });
                return Ok(path);
            }
            Err(error) => {
                log::warn!("Failed to write {format} slide {}: {error}", path.display());
                tracker.export_event(ExportEvent::Failed {
                    path,
                    format,
                    reason: error.to_string(),
                });
                last_error = error;
            }
        }
    }

    Err(last_error)
}
