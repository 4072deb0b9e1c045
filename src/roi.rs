//! Comparison regions.
//!
//! A [`Roi`] restricts frame comparison to a sub-rectangle of the video. It
//! never crops the exported image; written slides always contain the full
//! frame.
//!
//! # Example
//!
//! ```
//! use slide_extract::Roi;
//!
//! let roi: Roi = "10.20:300x40".parse()?;
//! assert_eq!(roi, Roi::new(10, 20, 300, 40)?);
//! assert_eq!(roi.to_string(), "10.20:300x40");
//! # Ok::<(), slide_extract::SlideError>(())
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use crate::error::SlideError;

/// An axis-aligned rectangle in source-frame pixel coordinates.
///
/// Width and height are always non-zero; use `Option<Roi>` to mean
/// "compare the full frame".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Roi {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels (non-zero).
    pub width: u32,
    /// Height in pixels (non-zero).
    pub height: u32,
}

impl Roi {
    /// Create a region, rejecting zero-sized rectangles.
    ///
    /// # Errors
    ///
    /// Returns [`SlideError::InvalidRoiSyntax`] if `width` or `height` is 0.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Result<Self, SlideError> {
        if width == 0 || height == 0 {
            return Err(SlideError::InvalidRoiSyntax(format!(
                "{x}.{y}:{width}x{height}"
            )));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Build the normalized rectangle spanned by two corner points.
    ///
    /// The corners may be given in any order (the user can drag in any
    /// direction). Negative coordinates are clamped to the frame edge.
    /// Returns `None` when the points share a row or a column.
    pub fn from_corners(first: (i32, i32), second: (i32, i32)) -> Option<Self> {
        let (x1, y1) = (first.0.max(0) as u32, first.1.max(0) as u32);
        let (x2, y2) = (second.0.max(0) as u32, second.1.max(0) as u32);

        let x = x1.min(x2);
        let y = y1.min(y2);
        Self::new(x, y, x1.abs_diff(x2), y1.abs_diff(y2)).ok()
    }

    /// One past the right-most column covered by the region.
    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    /// One past the bottom-most row covered by the region.
    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    /// Returns `true` if the region lies entirely inside a `width`×`height`
    /// frame.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= u64::from(width) && self.bottom() <= u64::from(height)
    }
}

impl FromStr for Roi {
    type Err = SlideError;

    /// Parse the `X.Y:WxH` syntax used on the command line.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || SlideError::InvalidRoiSyntax(value.to_string());

        let (origin, size) = value.split_once(':').ok_or_else(invalid)?;
        let (x, y) = origin.split_once('.').ok_or_else(invalid)?;
        let (width, height) = size.split_once('x').ok_or_else(invalid)?;

        let parse = |field: &str| field.parse::<u32>().map_err(|_| invalid());
        Self::new(parse(x)?, parse(y)?, parse(width)?, parse(height)?)
            .map_err(|_| invalid())
    }
}

impl Display for Roi {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}.{}:{}x{}", self.x, self.y, self.width, self.height)
    }
}
