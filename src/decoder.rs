//! Sequential video frame reading.
//!
//! The extractor never seeks: it walks each video once, front to back, and
//! only converts the frames it needs. [`FrameSource`] captures exactly that
//! contract, and [`VideoOpener`] produces one source per video file. The
//! FFmpeg-backed implementation is [`VideoReader`], opened through
//! [`FfmpegOpener`].
//!
//! # Example
//!
//! ```no_run
//! use framepick::{FrameSource, VideoReader};
//!
//! let mut reader = VideoReader::open("seq1/seq1_blur_1.mp4")?;
//! let mut position = 0_u64;
//! while reader.advance()? {
//!     if position == 3 {
//!         reader.current_frame()?.save("frame_0003.png")?;
//!         break;
//!     }
//!     position += 1;
//! }
//! # Ok::<(), framepick::FramePickError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::error::FramePickError;

/// Consecutive demuxer read failures tolerated before a stream is abandoned.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 64;

/// A forward-only stream of decoded frames.
///
/// Frames are visited in native decode order. [`advance`](FrameSource::advance)
/// moves to the next frame; [`current_frame`](FrameSource::current_frame)
/// converts the frame the source is positioned on, so frames that are only
/// passed over are never converted.
pub trait FrameSource {
    /// Move to the next frame. Returns `false` once the stream is exhausted.
    fn advance(&mut self) -> Result<bool, FramePickError>;

    /// Pixel data of the frame the last successful `advance` stopped on.
    fn current_frame(&mut self) -> Result<RgbImage, FramePickError>;

    /// Number of frames the container claims to hold, if it says.
    fn frame_count_hint(&self) -> Option<u64> {
        None
    }
}

/// Opens a [`FrameSource`] for a video file.
pub trait VideoOpener {
    type Source: FrameSource;

    fn open(&self, path: &Path) -> Result<Self::Source, FramePickError>;
}

/// Opens videos with FFmpeg.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegOpener;

impl VideoOpener for FfmpegOpener {
    type Source = VideoReader;

    fn open(&self, path: &Path) -> Result<VideoReader, FramePickError> {
        VideoReader::open(path)
    }
}

/// FFmpeg-backed sequential reader over the best video stream of a file.
///
/// The demuxer and decoder are released when the reader is dropped.
pub struct VideoReader {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    video_stream_index: usize,
    width: u32,
    height: u32,
    frame_count: Option<u64>,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    has_frame: bool,
    eof_sent: bool,
    path: PathBuf,
}

impl Debug for VideoReader {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoReader")
            .field("path", &self.path)
            .field("video_stream_index", &self.video_stream_index)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("frame_count", &self.frame_count)
            .finish_non_exhaustive()
    }
}

impl VideoReader {
    /// Open `path` and prepare a decoder for its best video stream.
    ///
    /// # Errors
    ///
    /// - [`FramePickError::VideoOpen`] if FFmpeg cannot open the file.
    /// - [`FramePickError::NoVideoStream`] if it has no video stream.
    /// - [`FramePickError::FfmpegError`] if no decoder or scaler can be built.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramePickError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening video: {}", path.display());

        ffmpeg_next::init().map_err(|error| FramePickError::VideoOpen {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| FramePickError::VideoOpen {
                path: path.clone(),
                reason: error.to_string(),
            })?;

        let (video_stream_index, frame_count, decoder) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or(FramePickError::NoVideoStream)?;

            let decoder_context = CodecContext::from_parameters(stream.parameters())?;
            let decoder = decoder_context.decoder().video()?;

            (stream.index(), stream_frame_count(&stream, &input_context), decoder)
        };

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        Ok(Self {
            input_context,
            decoder,
            scaler,
            video_stream_index,
            width,
            height,
            frame_count,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            has_frame: false,
            eof_sent: false,
            path,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Frame count from the stream header, falling back to duration × rate.
///
/// Container duration is in AV_TIME_BASE units (microseconds).
fn stream_frame_count(stream: &ffmpeg_next::Stream<'_>, input_context: &Input) -> Option<u64> {
    let frames = stream.frames();
    if frames > 0 {
        return Some(frames as u64);
    }

    let rate = stream.avg_frame_rate();
    let duration = input_context.duration();
    if rate.denominator() == 0 || rate.numerator() <= 0 || duration <= 0 {
        return None;
    }

    let frames_per_second = f64::from(rate.numerator()) / f64::from(rate.denominator());
    let seconds = duration as f64 / 1_000_000.0;
    Some((seconds * frames_per_second) as u64)
}

impl FrameSource for VideoReader {
    fn advance(&mut self) -> Result<bool, FramePickError> {
        let mut read_errors = 0_u32;

        loop {
            // Frames the decoder already holds come first.
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                self.has_frame = true;
                return Ok(true);
            }

            if self.eof_sent {
                self.has_frame = false;
                return Ok(false);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    read_errors = 0;
                    if packet.stream() == self.video_stream_index {
                        self.decoder.send_packet(&packet)?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    read_errors += 1;
                    log::debug!("Skipping unreadable packet in {}: {error}", self.path.display());
                    if read_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        return Err(FramePickError::VideoDecodeError(format!(
                            "{read_errors} consecutive read errors in {}: {error}",
                            self.path.display()
                        )));
                    }
                }
            }
        }
    }

    fn current_frame(&mut self) -> Result<RgbImage, FramePickError> {
        if !self.has_frame {
            return Err(FramePickError::VideoDecodeError(
                "No decoded frame is available".to_string(),
            ));
        }

        self.scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;
        let buffer = frame_to_buffer(&self.rgb_frame, self.width, self.height, 3);
        RgbImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
            FramePickError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })
    }

    fn frame_count_hint(&self) -> Option<u64> {
        self.frame_count
    }
}

impl Drop for VideoReader {
    fn drop(&mut self) {
        log::debug!("Closing video: {}", self.path.display());
    }
}

/// Copy a frame's first plane into a tightly packed buffer, dropping the
/// per-row padding FFmpeg adds when stride exceeds `width * bytes_per_pixel`.
fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_length = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_length {
        return data[..row_length * (height as usize)].to_vec();
    }

    (0..height as usize)
        .flat_map(|row| &data[row * stride..row * stride + row_length])
        .copied()
        .collect()
}
