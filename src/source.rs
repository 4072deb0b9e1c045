//! Sequential frame sources.
//!
//! [`FrameSource`] is the "read the next frame or report end-of-stream"
//! boundary the extraction engine and the region selector are written
//! against. [`VideoSource`] implements it on top of FFmpeg: each call to
//! [`read_frame`](FrameSource::read_frame) reads and decodes just enough
//! packets to produce the next frame, converts it to RGB24, and lends it out
//! until the following call.
//!
//! # Example
//!
//! ```no_run
//! use slide_extract::{FrameSource, VideoSource};
//!
//! let mut source = VideoSource::open("talk.mp4")?;
//! while let Some(frame) = source.read_frame()? {
//!     println!("{:?}: {}x{}", frame.timestamp(), frame.width(), frame.height());
//! }
//! # Ok::<(), slide_extract::SlideError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::{error::SlideError, frame::Frame};

/// Consecutive demuxer read errors tolerated before giving up.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 32;

/// A pull-based source of decoded frames.
///
/// The returned frame borrows the source and is only valid until the next
/// call; sources are free to reuse the underlying buffer.
pub trait FrameSource {
    /// Decode the next frame, or return `Ok(None)` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the stream is corrupt beyond recovery.
    fn read_frame(&mut self) -> Result<Option<&Frame>, SlideError>;

    /// Number of frames the container expects to deliver, if known.
    fn frame_count_hint(&self) -> Option<u64> {
        None
    }
}

/// An FFmpeg-backed video file opened for sequential decoding.
///
/// The demuxer, decoder, and scaler are released when the value is dropped.
pub struct VideoSource {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: Option<ScalingContext>,
    video_stream_index: usize,
    time_base: Rational,
    start_time: i64,
    frame_count: Option<u64>,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    current: Frame,
    eof_sent: bool,
    done: bool,
    path: PathBuf,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("path", &self.path)
            .field("video_stream_index", &self.video_stream_index)
            .field("time_base", &self.time_base)
            .field("frame_count", &self.frame_count)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a video file and prepare a decoder for its best video stream.
    ///
    /// Initializes FFmpeg (idempotent) on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SlideError::CannotOpenSource`] if the file cannot be opened,
    /// has no video stream, or its codec cannot be decoded.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SlideError> {
        let path = path.as_ref();
        let cannot_open = |reason: String| SlideError::CannotOpenSource {
            path: path.to_path_buf(),
            reason,
        };

        log::debug!("Opening video source: {}", path.display());

        ffmpeg_next::init()
            .map_err(|error| cannot_open(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| cannot_open(error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| cannot_open("no video stream found".to_string()))?;

        let video_stream_index = stream.index();
        let time_base = stream.time_base();
        // AV_NOPTS_VALUE is i64::MIN; only a real positive start offset is subtracted.
        let start_time = stream.start_time().max(0);
        let frame_count = u64::try_from(stream.frames()).ok().filter(|&count| count > 0);

        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| cannot_open(format!("failed to read codec parameters: {error}")))?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| cannot_open(format!("failed to create video decoder: {error}")))?;

        log::debug!(
            "Decoding stream {} ({}x{}, time base {}/{})",
            video_stream_index,
            decoder.width(),
            decoder.height(),
            time_base.numerator(),
            time_base.denominator(),
        );

        Ok(Self {
            input_context,
            decoder,
            scaler: None,
            video_stream_index,
            time_base,
            start_time,
            frame_count,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            current: Frame::default(),
            eof_sent: false,
            done: false,
            path: path.to_path_buf(),
        })
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Convert the current `decoded_frame` to RGB24 into `current`.
    ///
    /// The scaler is built on the first frame and rebuilt whenever the
    /// decoder changes resolution or pixel format mid-stream.
    fn convert_decoded_frame(&mut self) -> Result<(), SlideError> {
        let format = self.decoded_frame.format();
        let width = self.decoded_frame.width();
        let height = self.decoded_frame.height();

        let stale = self.scaler.as_ref().is_none_or(|scaler| {
            let input = scaler.input();
            input.format != format || input.width != width || input.height != height
        });
        if stale {
            self.scaler = Some(ScalingContext::get(
                format,
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?);
        }

        if let Some(scaler) = self.scaler.as_mut() {
            scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;
        }

        let pts = self
            .decoded_frame
            .pts()
            .or_else(|| self.decoded_frame.timestamp())
            .unwrap_or(self.start_time);
        let timestamp = crate::utilities::pts_to_duration(pts, self.start_time, self.time_base);

        let rgb_frame = &self.rgb_frame;
        let filled = self.current.refill(width, height, timestamp, |buffer| {
            crate::utilities::frame_to_buffer(rgb_frame, width, height, 3, buffer);
        });
        if !filled {
            return Err(SlideError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            ));
        }
        Ok(())
    }
}

impl FrameSource for VideoSource {
    fn read_frame(&mut self) -> Result<Option<&Frame>, SlideError> {
        if self.done {
            return Ok(None);
        }

        let mut read_errors = 0;
        loop {
            // Try to receive a frame the decoder has already produced.
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                if let Err(error) = self.convert_decoded_frame() {
                    self.done = true;
                    return Err(error);
                }
                return Ok(Some(&self.current));
            }

            if self.eof_sent {
                // Already sent EOF and the decoder is drained.
                self.done = true;
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    read_errors = 0;
                    if packet.stream() == self.video_stream_index {
                        if let Err(error) = self.decoder.send_packet(&packet) {
                            // A single corrupt packet is skipped; the decoder resyncs on the next keyframe.
                            log::warn!("Skipping undecodable packet: {error}");
                        }
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    read_errors += 1;
                    if read_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        self.done = true;
                        return Err(SlideError::VideoDecodeError(format!(
                            "Giving up after {read_errors} consecutive read errors: {error}"
                        )));
                    }
                }
            }
        }
    }

    fn frame_count_hint(&self) -> Option<u64> {
        self.frame_count
    }
}
