//! # framepick
//!
//! Prepare a dataset split from a multi-video annotation corpus.
//!
//! Given a COCO-style global annotation file covering every distorted
//! encoding of every sequence, a manifest of the sequences in a split, and a
//! per-sequence list of allowed distortion types, `framepick`
//!
//! 1. writes a reduced annotation file holding only the selected images and
//!    the annotations that reference them, and
//! 2. optionally pulls the selected frames out of their source videos,
//!    decoding each video once, front to back, with FFmpeg via
//!    [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next).
//!
//! [`dump_frames`] (the `framedump` binary) writes every frame of every
//! encoding of a split's sequences instead, numbered from 1.
//!
//! ## Quick Start
//!
//! ```no_run
//! use framepick::PipelineConfig;
//!
//! let config = PipelineConfig::new("test")
//!     .with_global_json_path("JSON_GLOBAL_FULL/global_annotations.json")
//!     .with_sequence_list_path("dataset_config/test.txt")
//!     .with_distortion_dir("distortion_type_")
//!     .with_videos_dir("distorted_video")
//!     .with_output_json_path("dataset_config/test.json")
//!     .with_output_frames_dir("dataset_config/filtered_frames")
//!     .with_extract_frames(true);
//!
//! let summary = framepick::run(&config)?;
//! println!("{} images selected", summary.images_selected);
//! # Ok::<(), framepick::FramePickError>(())
//! ```
//!
//! ## Layout on disk
//!
//! - Sequence manifest: one sequence name per non-blank line.
//! - Allow-lists: `<distortion_dir>/<sequence>.txt`, one distortion type per
//!   non-blank line.
//! - Source videos: `<videos_dir>/<sequence>/<sequence>_<distortion>_<severity>.mp4`.
//! - Extracted frames: `<output_frames_dir>/<file_name>` for each selected
//!   image, where the 4-digit number before `.jpg` in `file_name` is the
//!   0-based frame index.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod annotation;
pub mod configuration;
pub mod decoder;
pub mod error;
pub mod extractor;
pub mod ffmpeg;
pub mod frame_target;
pub mod manifest;
pub mod pipeline;
pub mod progress;
pub mod selector;

pub use annotation::{
    AnnotationCollection, AnnotationRecord, DatasetInfo, FilteredCollection, ImageRecord,
};
pub use configuration::{ExtractOptions, PipelineConfig};
pub use decoder::{FfmpegOpener, FrameSource, VideoOpener, VideoReader};
pub use error::FramePickError;
pub use extractor::{ExtractionReport, FrameExtractor, GroupOutcome};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use frame_target::{FrameTarget, SEVERITY_LEVELS, VideoKey};
pub use manifest::{AllowLists, DistortionAllowList, SequenceManifest, load_allow_lists};
pub use pipeline::{
    DumpSummary, RunSummary, dump_frames, dump_frames_with_opener, run, run_with_opener,
};
pub use progress::{ProgressCallback, ProgressInfo, TerminalProgress};
pub use selector::select;
