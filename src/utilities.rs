//! Internal utility functions.
//!
//! Helpers for pixel-data copying and timestamp conversion shared by the
//! frame sources.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy pixel data from an FFmpeg frame into `buffer`, dropping row padding.
///
/// `bytes_per_pixel` is 3 for RGB24. `buffer` is cleared first and reused so
/// its allocation survives across frames.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    buffer: &mut Vec<u8>,
) {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    buffer.clear();
    if stride == expected_stride {
        buffer.extend_from_slice(&data[..expected_stride * (height as usize)]);
    } else {
        buffer.reserve(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
    }
}

/// Convert a PTS in `time_base` units to a [`Duration`] since `start`.
///
/// Integer arithmetic keeps millisecond truncation exact. Timestamps before
/// `start` clamp to zero.
pub(crate) fn pts_to_duration(pts: i64, start: i64, time_base: Rational) -> Duration {
    let numerator = i128::from(time_base.numerator());
    let denominator = i128::from(time_base.denominator());
    if denominator == 0 {
        return Duration::ZERO;
    }

    let ticks = i128::from(pts) - i128::from(start);
    let micros = ticks * numerator * 1_000_000 / denominator;
    Duration::from_micros(micros.clamp(0, i128::from(u64::MAX)) as u64)
}
