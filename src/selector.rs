//! Interactive region selection.
//!
//! A [`RoiSelection`] is the state of one selection session: where the drag
//! started, where the pointer is now, and whether the user confirmed. The
//! preview window feeds it [`PointerEvent`]s and a confirmation keypress;
//! the session turns that into a normalized [`Roi`].
//!
//! The window itself is OpenCV `highgui` and only exists with the `gui`
//! feature; see [`select_roi`](crate::select_roi).
//!
//! # Example
//!
//! ```
//! use slide_extract::{PointerEvent, Roi, RoiSelection};
//!
//! let mut selection = RoiSelection::new();
//! selection.handle(PointerEvent::Press { x: 90, y: 60 });
//! selection.handle(PointerEvent::Drag { x: 10, y: 20 });
//! selection.confirm();
//!
//! assert_eq!(selection.finish()?, Roi::new(10, 20, 80, 40)?);
//! # Ok::<(), slide_extract::SlideError>(())
//! ```

use crate::{error::SlideError, roi::Roi};

/// Pointer input relevant to drawing a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    /// Primary button pressed: starts a new rectangle.
    Press { x: i32, y: i32 },
    /// Pointer moved with the primary button held.
    Drag { x: i32, y: i32 },
    /// Primary button released.
    Release { x: i32, y: i32 },
}

/// State of one region-selection session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoiSelection {
    anchor: Option<(i32, i32)>,
    cursor: Option<(i32, i32)>,
    confirmed: bool,
}

impl RoiSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one pointer event.
    ///
    /// Returns `true` if the drawn rectangle changed and the overlay should
    /// be redrawn.
    pub fn handle(&mut self, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Press { x, y } => {
                self.anchor = Some((x, y));
                self.cursor = Some((x, y));
                true
            }
            PointerEvent::Drag { x, y } | PointerEvent::Release { x, y } => {
                if self.anchor.is_none() || self.cursor == Some((x, y)) {
                    return false;
                }
                self.cursor = Some((x, y));
                true
            }
        }
    }

    /// The rectangle drawn so far, if it is not degenerate.
    pub fn rectangle(&self) -> Option<Roi> {
        Roi::from_corners(self.anchor?, self.cursor?)
    }

    /// Record the confirming keypress.
    pub fn confirm(&mut self) {
        self.confirmed = true;
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Finish the session.
    ///
    /// # Errors
    ///
    /// Returns [`SlideError::NoRegionSelected`] unless the user confirmed a
    /// non-degenerate rectangle.
    pub fn finish(&self) -> Result<Roi, SlideError> {
        match self.rectangle() {
            Some(roi) if self.confirmed => Ok(roi),
            _ => Err(SlideError::NoRegionSelected),
        }
    }
}
