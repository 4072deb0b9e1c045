//! Decoded frames and timestamp-derived slide names.

use std::{path::PathBuf, time::Duration};

use image::RgbImage;

/// A decoded RGB8 video frame and its presentation timestamp.
///
/// Frame sources lend frames by reference and may overwrite the pixel buffer
/// on the next read. Anything that must outlive the current iteration has to
/// go through [`duplicate`](Frame::duplicate).
#[derive(Debug, PartialEq)]
pub struct Frame {
    image: RgbImage,
    timestamp: Duration,
}

impl Frame {
    /// Wrap an image decoded at `timestamp`.
    pub fn new(image: RgbImage, timestamp: Duration) -> Self {
        Self { image, timestamp }
    }

    /// The decoded pixels.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Presentation timestamp reported by the decoder.
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Deep-copy the frame into an independently owned buffer.
    pub fn duplicate(&self) -> Frame {
        Frame {
            image: self.image.clone(),
            timestamp: self.timestamp,
        }
    }

    /// Refill the pixel buffer in place, reusing its allocation.
    ///
    /// `fill` receives the raw buffer and must leave exactly
    /// `width * height * 3` bytes in it.
    pub(crate) fn refill<F>(&mut self, width: u32, height: u32, timestamp: Duration, fill: F) -> bool
    where
        F: FnOnce(&mut Vec<u8>),
    {
        let mut buffer = std::mem::replace(&mut self.image, RgbImage::new(0, 0)).into_raw();
        fill(&mut buffer);
        self.timestamp = timestamp;
        match RgbImage::from_raw(width, height, buffer) {
            Some(image) => {
                self.image = image;
                true
            }
            None => false,
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new(RgbImage::new(0, 0), Duration::ZERO)
    }
}

/// Format a timestamp as `HH_MM_SS_mmm`.
///
/// Every field is truncated, never rounded. Hours keep counting past 24.
///
/// ```
/// use std::time::Duration;
///
/// assert_eq!(slide_extract::slide_stem(Duration::from_millis(3_723_004)), "01_02_03_004");
/// ```
pub fn slide_stem(timestamp: Duration) -> String {
    let total_millis = timestamp.as_millis();
    let hours = total_millis / 3_600_000;
    let minutes = total_millis / 60_000 % 60;
    let seconds = total_millis / 1_000 % 60;
    let millis = total_millis % 1_000;
    format!("{hours:02}_{minutes:02}_{seconds:02}_{millis:03}")
}

/// Build the output path for a slide: `{prefix}{HH_MM_SS_mmm}.{extension}`.
///
/// The prefix is concatenated verbatim, so it may carry directory components
/// as well as a file-name stem.
pub fn slide_path(prefix: &str, timestamp: Duration, extension: &str) -> PathBuf {
    PathBuf::from(format!("{prefix}{}.{extension}", slide_stem(timestamp)))
}
