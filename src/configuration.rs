//! Run configuration.
//!
//! [`PipelineConfig`] names every input and output of a run;
//! [`ExtractOptions`] carries the frame-writing settings and the progress
//! callback without widening every function signature.
//!
//! # Example
//!
//! ```no_run
//! use framepick::{ExtractOptions, PipelineConfig};
//!
//! let config = PipelineConfig::new("test")
//!     .with_global_json_path("JSON_GLOBAL_FULL/global_annotations.json")
//!     .with_sequence_list_path("dataset_config/test.txt")
//!     .with_distortion_dir("distortion_type_")
//!     .with_videos_dir("distorted_video")
//!     .with_output_json_path("dataset_config/test.json")
//!     .with_output_frames_dir("dataset_config/filtered_frames")
//!     .with_extract_frames(true)
//!     .with_extract_options(ExtractOptions::new().with_jpeg_quality(90));
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::PathBuf,
    sync::Arc,
};

use crate::progress::{NoOpProgress, ProgressCallback};

/// JPEG quality used when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Settings for writing extracted frames.
#[derive(Clone)]
pub struct ExtractOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) batch_size: u64,
    pub(crate) jpeg_quality: u8,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("batch_size", &self.batch_size)
            .field("jpeg_quality", &self.jpeg_quality)
            .finish_non_exhaustive()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Defaults: no progress callback, batch size 1, JPEG quality 95.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Fire the progress callback every `size` decoded frames. Clamped to 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// JPEG quality of written frames, clamped to `1..=100`.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }
}

/// Everything one run reads and writes.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Name of the split (`train`, `test`, ...), used in log lines.
    pub set: String,
    /// Global annotation file.
    pub global_json_path: PathBuf,
    /// Sequence manifest of the split.
    pub sequence_list_path: PathBuf,
    /// Directory holding one `<sequence>.txt` allow-list per sequence.
    pub distortion_dir: PathBuf,
    /// Root of the source videos.
    pub videos_dir: PathBuf,
    /// Where the filtered annotation file is written.
    pub output_json_path: PathBuf,
    /// Where extracted frames are written.
    pub output_frames_dir: PathBuf,
    /// Whether frames are extracted after selection.
    pub extract_frames: bool,
    pub extract_options: ExtractOptions,
}

impl PipelineConfig {
    pub fn new(set: impl Into<String>) -> Self {
        Self {
            set: set.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_global_json_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_json_path = path.into();
        self
    }

    #[must_use]
    pub fn with_sequence_list_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sequence_list_path = path.into();
        self
    }

    #[must_use]
    pub fn with_distortion_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.distortion_dir = path.into();
        self
    }

    #[must_use]
    pub fn with_videos_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.videos_dir = path.into();
        self
    }

    #[must_use]
    pub fn with_output_json_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_json_path = path.into();
        self
    }

    #[must_use]
    pub fn with_output_frames_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_frames_dir = path.into();
        self
    }

    #[must_use]
    pub fn with_extract_frames(mut self, enabled: bool) -> Self {
        self.extract_frames = enabled;
        self
    }

    #[must_use]
    pub fn with_extract_options(mut self, options: ExtractOptions) -> Self {
        self.extract_options = options;
        self
    }
}
