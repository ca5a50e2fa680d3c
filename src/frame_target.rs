//! Mapping image records onto source videos and frame indices.
//!
//! Every distorted encoding of a sequence lives in its own file:
//!
//! ```text
//! <videos_dir>/<sequence>/<sequence>_<distortion>_<severity>.mp4
//! ```
//!
//! and every image record names the frame it was cut from in its file name,
//! as a 4-digit zero-padded index right before the `.jpg` suffix
//! (`seq1_blur_2_frame_0042.jpg` is frame 42, counting from 0 in decode
//! order).

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use crate::annotation::ImageRecord;

/// Container extension of every source video.
pub const VIDEO_EXTENSION: &str = "mp4";

/// Severity levels every distortion is encoded at.
pub const SEVERITY_LEVELS: [u32; 4] = [1, 2, 3, 4];

const FRAME_SUFFIX: &str = ".jpg";
const FRAME_DIGITS: usize = 4;

/// Identifies one source video: a sequence under one distortion at one
/// severity level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VideoKey {
    pub sequence: String,
    pub distortion: String,
    pub severity: String,
}

impl VideoKey {
    pub fn new(
        sequence: impl Into<String>,
        distortion: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            sequence: sequence.into(),
            distortion: distortion.into(),
            severity: severity.into(),
        }
    }

    /// The key of the video `image` was cut from, if the record names one.
    pub fn from_image(image: &ImageRecord) -> Option<Self> {
        Some(Self::new(
            image.video_name()?,
            image.distortion_type()?,
            image.severity_level()?,
        ))
    }

    /// File name of the video, without directory.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.{VIDEO_EXTENSION}",
            self.sequence, self.distortion, self.severity
        )
    }

    /// Location of the video below `videos_dir`.
    pub fn video_path(&self, videos_dir: &Path) -> PathBuf {
        videos_dir.join(&self.sequence).join(self.file_name())
    }

    /// Name of the `number`th frame (1-based) when a whole video is dumped,
    /// e.g. `seq1_blur_lvl2_frame_0001.jpg`.
    pub fn dumped_frame_name(&self, number: u64) -> String {
        format!(
            "{}_{}_lvl{}_frame_{number:04}{FRAME_SUFFIX}",
            self.sequence, self.distortion, self.severity
        )
    }
}

impl Display for VideoKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}/{}_{}_{}",
            self.sequence, self.sequence, self.distortion, self.severity
        )
    }
}

/// A 0-based frame index in a video's decode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameTarget(u64);

impl FrameTarget {
    pub fn new(index: u64) -> Self {
        Self(index)
    }

    pub fn index(self) -> u64 {
        self.0
    }

    /// Parse the frame index out of an image file name.
    ///
    /// The name must end in `_DDDD.jpg` with exactly four ASCII digits.
    /// Anything else yields `None`.
    ///
    /// ```
    /// use framepick::FrameTarget;
    ///
    /// assert_eq!(FrameTarget::from_file_name("seq1_blur_1_frame_0003.jpg"), Some(FrameTarget::new(3)));
    /// assert_eq!(FrameTarget::from_file_name("seq1_blur_1_frame_12345.jpg"), None);
    /// assert_eq!(FrameTarget::from_file_name("seq1_blur_1_frame_0003.png"), None);
    /// ```
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(FRAME_SUFFIX)?.as_bytes();
        if stem.len() <= FRAME_DIGITS {
            return None;
        }

        let (head, digits) = stem.split_at(stem.len() - FRAME_DIGITS);
        if head.last() != Some(&b'_') || !digits.iter().all(u8::is_ascii_digit) {
            return None;
        }

        let index = digits
            .iter()
            .fold(0_u64, |value, digit| value * 10 + u64::from(digit - b'0'));
        Some(Self(index))
    }

    /// The frame index an image record refers to.
    pub fn from_image(image: &ImageRecord) -> Option<Self> {
        image.file_name().and_then(Self::from_file_name)
    }
}

impl Display for FrameTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}
