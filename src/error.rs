//! Error types for the `framepick` crate.
//!
//! This module defines [`FramePickError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry the offending path or
//! record so a failed run can be diagnosed from the message alone.
//!
//! Only configuration-level failures (missing manifest, unreadable global
//! annotation file, unwritable output) ever reach the caller of
//! [`crate::pipeline::run`]. Per-video and per-frame failures are absorbed by
//! the [`FrameExtractor`](crate::FrameExtractor) and surface in its
//! [`ExtractionReport`](crate::ExtractionReport) instead.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framepick` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramePickError {
    /// The sequence manifest does not exist.
    #[error("Sequence manifest not found at {path}")]
    ManifestNotFound {
        /// Path of the manifest that was looked up.
        path: PathBuf,
    },

    /// The sequence manifest exists but names no sequence.
    #[error("No sequence names found in {path}")]
    EmptyManifest {
        /// Path of the empty manifest.
        path: PathBuf,
    },

    /// A plain-text list could not be read.
    #[error("Failed to read text list at {path}: {source}")]
    TextRead {
        /// Path of the list.
        path: PathBuf,
        /// Underlying I/O failure.
        source: IoError,
    },

    /// An annotation file could not be read or parsed.
    #[error("Failed to read annotation file at {path}: {reason}")]
    JsonRead {
        /// Path of the annotation file.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// The filtered annotation file could not be written.
    #[error("Failed to write annotation file at {path}: {reason}")]
    JsonWrite {
        /// Destination path.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// An image or annotation object lacks a field the selector keys on.
    #[error("Invalid {kind} record: {reason}")]
    InvalidRecord {
        /// `"image"` or `"annotation"`.
        kind: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A source video could not be opened.
    #[error("Failed to open video at {path}: {reason}")]
    VideoOpen {
        /// Path of the video.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for FramePickError {
    fn from(error: FfmpegError) -> Self {
        FramePickError::FfmpegError(error.to_string())
    }
}
