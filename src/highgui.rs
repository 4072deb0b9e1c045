//! OpenCV preview window for drawing the comparison region.
//!
//! This module is available when the `gui` feature is enabled.

use std::{
    path::Path,
    sync::{Arc, Mutex, PoisonError},
};

use image::RgbImage;
use opencv::{
    core::{CV_8UC3, Mat, Rect, Scalar},
    highgui, imgproc,
    prelude::*,
};

use crate::{
    error::SlideError,
    roi::Roi,
    selector::{PointerEvent, RoiSelection},
    source::{FrameSource, VideoSource},
};

const WINDOW_NAME: &str = "frame";
/// Milliseconds to wait for a keypress between frames.
const KEY_POLL_MS: i32 = 10;

/// Destroys the window on every exit path.
struct PreviewWindow;

impl PreviewWindow {
    fn open() -> Result<Self, SlideError> {
        highgui::named_window(WINDOW_NAME, highgui::WINDOW_AUTOSIZE)?;
        Ok(Self)
    }
}

impl Drop for PreviewWindow {
    fn drop(&mut self) {
        let _ = highgui::destroy_window(WINDOW_NAME);
    }
}

/// Play the video at `source` and let the user drag a rectangle over it.
///
/// Playback stops at the first keypress. The rectangle is redrawn on every
/// frame while the user drags.
///
/// # Errors
///
/// - [`SlideError::CannotOpenSource`] if the video cannot be opened.
/// - [`SlideError::NoRegionSelected`] if the video ends before a keypress,
///   or the keypress comes before a non-degenerate rectangle was drawn.
/// - [`SlideError::Gui`] if the window cannot be driven.
pub fn select_roi<P: AsRef<Path>>(source: P) -> Result<Roi, SlideError> {
    let mut video = VideoSource::open(source)?;
    let _window = PreviewWindow::open()?;

    let session = Arc::new(Mutex::new(RoiSelection::new()));
    let callback_session = Arc::clone(&session);
    highgui::set_mouse_callback(
        WINDOW_NAME,
        Some(Box::new(move |event, x, y, flags| {
            if let Some(pointer) = pointer_event(event, x, y, flags) {
                callback_session
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .handle(pointer);
            }
        })),
    )?;

    while let Some(frame) = video.read_frame()? {
        let mut preview = image_to_mat(frame.image())?;

        let rectangle = session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rectangle();
        if let Some(roi) = rectangle {
            imgproc::rectangle(
                &mut preview,
                Rect::new(roi.x as i32, roi.y as i32, roi.width as i32, roi.height as i32),
                Scalar::new(0.0, 255.0, 0.0, 0.0),
                1,
                imgproc::LINE_8,
                0,
            )?;
        }
        highgui::imshow(WINDOW_NAME, &preview)?;

        if highgui::wait_key(KEY_POLL_MS)? != -1 {
            session
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .confirm();
            break;
        }
    }

    highgui::set_mouse_callback(WINDOW_NAME, None)?;

    let selection = *session.lock().unwrap_or_else(PoisonError::into_inner);
    selection.finish()
}

/// Map a raw OpenCV mouse callback to a pointer event.
fn pointer_event(event: i32, x: i32, y: i32, flags: i32) -> Option<PointerEvent> {
    let primary_held = flags & highgui::EVENT_FLAG_LBUTTON != 0;
    match event {
        highgui::EVENT_LBUTTONDOWN => Some(PointerEvent::Press { x, y }),
        highgui::EVENT_MOUSEMOVE if primary_held => Some(PointerEvent::Drag { x, y }),
        highgui::EVENT_LBUTTONUP => Some(PointerEvent::Release { x, y }),
        _ => None,
    }
}

/// Copy an RGB image into a BGR `Mat` for display.
fn image_to_mat(image: &RgbImage) -> Result<Mat, SlideError> {
    let mut mat = Mat::new_rows_cols_with_default(
        image.height() as i32,
        image.width() as i32,
        CV_8UC3,
        Scalar::all(0.0),
    )?;

    for (bgr, rgb) in mat
        .data_bytes_mut()?
        .chunks_exact_mut(3)
        .zip(image.as_raw().chunks_exact(3))
    {
        bgr[0] = rgb[2];
        bgr[1] = rgb[1];
        bgr[2] = rgb[0];
    }

    Ok(mat)
}
