//! Frame similarity.
//!
//! Frames are compared with normalized cross-correlation over every RGB
//! sample of the compared region:
//!
//! ```text
//!            Σ a·b
//! score = ───────────────
//!         √(Σ a² · Σ b²)
//! ```
//!
//! This is template matching of two equal-sized regions against each other,
//! so the correlation map has a single entry and that entry is the peak.
//! Pixel samples are non-negative, which keeps the score in `[0, 1]`.

use image::RgbImage;

use crate::{error::SlideError, roi::Roi};

const CHANNELS: usize = 3;

/// Compare two frames, optionally restricted to `roi`.
///
/// Returns 1.0 for identical content. Frames with different dimensions are
/// never considered similar and score 0.0. Two all-black regions are
/// identical and score 1.0; an all-black region against anything else
/// scores 0.0.
///
/// # Errors
///
/// Returns [`SlideError::RoiOutOfBounds`] if `roi` does not fit inside the
/// frames.
///
/// # Example
///
/// ```
/// use image::{Rgb, RgbImage};
/// use slide_extract::{similarity, Roi};
///
/// let a = RgbImage::from_pixel(8, 8, Rgb([40, 80, 120]));
/// let b = a.clone();
/// assert_eq!(similarity(&a, &b, None)?, 1.0);
/// assert_eq!(similarity(&a, &b, Some(Roi::new(2, 2, 4, 4)?))?, 1.0);
/// # Ok::<(), slide_extract::SlideError>(())
/// ```
pub fn similarity(a: &RgbImage, b: &RgbImage, roi: Option<Roi>) -> Result<f64, SlideError> {
    if a.dimensions() != b.dimensions() {
        return Ok(0.0);
    }

    let (width, height) = a.dimensions();
    let region = match roi {
        Some(roi) if !roi.fits_within(width, height) => {
            return Err(SlideError::RoiOutOfBounds { roi, width, height });
        }
        Some(roi) => roi,
        None if width == 0 || height == 0 => return Ok(1.0),
        None => Roi {
            x: 0,
            y: 0,
            width,
            height,
        },
    };

    let stride = width as usize * CHANNELS;
    let row_start = region.x as usize * CHANNELS;
    let row_len = region.width as usize * CHANNELS;
    let a_raw = a.as_raw();
    let b_raw = b.as_raw();

    let mut cross = 0_u64;
    let mut energy_a = 0_u64;
    let mut energy_b = 0_u64;

    for row in region.y as usize..region.bottom() as usize {
        let start = row * stride + row_start;
        let a_row = &a_raw[start..start + row_len];
        let b_row = &b_raw[start..start + row_len];

        for (&p, &q) in a_row.iter().zip(b_row) {
            let (p, q) = (u64::from(p), u64::from(q));
            cross += p * q;
            energy_a += p * p;
            energy_b += q * q;
        }
    }

    Ok(normalize(cross, energy_a, energy_b))
}

fn normalize(cross: u64, energy_a: u64, energy_b: u64) -> f64 {
    match (energy_a, energy_b) {
        (0, 0) => 1.0,
        (0, _) | (_, 0) => 0.0,
        _ => {
            // A single sqrt of the product keeps identical regions at exactly 1.0.
            let denominator = (energy_a as f64 * energy_b as f64).sqrt();
            (cross as f64 / denominator).clamp(0.0, 1.0)
        }
    }
}
