//! # slide_extract
//!
//! Extract distinct slides from presentation recordings.
//!
//! A video is decoded frame by frame and every frame is compared with the
//! last slide that was written, using normalized cross-correlation over the
//! whole frame or over a chosen [`Roi`]. Frames that are not similar enough
//! become new slides and are written as `{prefix}HH_MM_SS_mmm.png`, named
//! after their presentation timestamp. Decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate; images are
//! encoded with [`image`](https://crates.io/crates/image).
//!
//! ## Quick Start
//!
//! ```no_run
//! use slide_extract::{ExtractOptions, SlideError};
//!
//! let summary = slide_extract::extract_slides("talk.mp4", "slides/talk_", &ExtractOptions::new())?;
//! println!("Total frames extracted: {}", summary.exported);
//! # Ok::<(), SlideError>(())
//! ```
//!
//! ### Compare Only the Slide Number
//!
//! Restricting comparison to a small region (for example the slide counter
//! in a corner) is faster and ignores a moving cursor or speaker overlay.
//!
//! ```no_run
//! use slide_extract::{ExtractOptions, Roi};
//!
//! let options = ExtractOptions::new()
//!     .with_roi("1180.680:80x30".parse::<Roi>()?)
//!     .with_threshold(0.995);
//! slide_extract::extract_slides("talk.mp4", "talk_", &options)?;
//! # Ok::<(), slide_extract::SlideError>(())
//! ```
//!
//! ## Features
//!
//! - **Change detection**: first frame always kept, then every frame whose
//!   similarity to the last slide is at or below the threshold
//! - **Region of interest**: compare a sub-rectangle, export full frames
//! - **Encode fallback**: PNG at best compression, then JPEG quality 95
//! - **Progress**: [`ProgressCallback`] for periodic snapshots and per-file
//!   export events
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `gui` | [`select_roi`] preview window via OpenCV `highgui` |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system. The `gui`
//! feature additionally needs OpenCV and libclang.

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod frame;
#[cfg(feature = "gui")]
pub mod highgui;
pub mod progress;
pub mod roi;
pub mod selector;
pub mod similarity;
pub mod source;
mod utilities;

pub use config::{DEFAULT_THRESHOLD, ExtractOptions, validate_threshold};
pub use engine::{ExtractionSummary, extract_from_source, extract_slides};
pub use error::SlideError;
pub use export::{DEFAULT_JPEG_QUALITY, DiskEncoder, ExportFormat, FrameEncoder};
pub use frame::{Frame, slide_path, slide_stem};
#[cfg(feature = "gui")]
pub use highgui::select_roi;
pub use progress::{ExportEvent, ProgressCallback, ProgressInfo};
pub use roi::Roi;
pub use selector::{PointerEvent, RoiSelection};
pub use similarity::similarity;
pub use source::{FrameSource, VideoSource};
