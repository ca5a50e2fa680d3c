//! Frame extraction.
//!
//! [`FrameExtractor`] writes out the frames a set of image records refers to.
//! Records are grouped by source video ([`VideoKey`]); each video is opened
//! once and read front to back with no seeking. The distinct frame indices
//! the group needs are walked in ascending order alongside the decoder, so a
//! single pass satisfies any sparse subset of indices, and reading stops as
//! soon as the last one has been written.
//!
//! A record matches a frame when the index parsed from its file name equals
//! the frame's position. Every matching record gets its own copy of the
//! frame, written as JPEG under its `file_name` below the output directory.
//!
//! [`FrameExtractor::dump_all`] is the bulk variant: it writes every frame of
//! every encoding of the listed sequences, numbered from 1.
//!
//! Extraction is best-effort. A missing or unreadable video, a stream that
//! ends early, or a file that cannot be written is logged, counted in the
//! [`ExtractionReport`], and the run moves on.
//!
//! # Example
//!
//! ```no_run
//! use framepick::{AnnotationCollection, FrameExtractor};
//!
//! let global = AnnotationCollection::load("global_annotations.json")?;
//! let report = FrameExtractor::new("distorted_video", "filtered_frames")
//!     .extract(&global.images);
//! println!("{} frames written", report.frames_written);
//! # Ok::<(), framepick::FramePickError>(())
//! ```

use std::{
    collections::{BTreeMap, HashMap},
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use image::{RgbImage, codecs::jpeg::JpegEncoder};

use crate::{
    annotation::ImageRecord,
    configuration::ExtractOptions,
    decoder::{FfmpegOpener, FrameSource, VideoOpener},
    error::FramePickError,
    frame_target::{FrameTarget, SEVERITY_LEVELS, VideoKey},
    manifest::{AllowLists, SequenceManifest},
    progress::ProgressTracker,
};

/// How extraction of one video ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    /// Every target frame was reached.
    Completed {
        /// Image files written for this video.
        frames_written: u64,
    },
    /// None of the group's records carries a frame index; the video was not
    /// opened.
    NoTargets,
    /// The video file does not exist.
    MissingVideo,
    /// The video exists but could not be opened.
    OpenFailed {
        reason: String,
    },
    /// The stream ended before the last target frame.
    PrematureEnd {
        /// Number of frames decoded before the end of stream.
        position: u64,
        frames_written: u64,
    },
    /// The decoder failed part-way through the stream.
    DecodeFailed {
        position: u64,
        frames_written: u64,
        reason: String,
    },
}

impl GroupOutcome {
    /// `true` when the video was never read.
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            GroupOutcome::MissingVideo | GroupOutcome::OpenFailed { .. }
        )
    }
}

/// What an extraction run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// One entry per video, in the order the videos were processed.
    pub groups: Vec<(VideoKey, GroupOutcome)>,
    /// Image files written across all videos.
    pub frames_written: u64,
    /// Frames decoded across all videos.
    pub frames_decoded: u64,
    /// Image files that could not be written.
    pub write_failures: u64,
    /// Records whose file name carries no frame index.
    pub records_without_target: u64,
    /// Records lacking the fields that locate their video.
    pub records_without_video: u64,
}

impl ExtractionReport {
    /// Videos that were skipped because they are missing or unopenable.
    pub fn skipped_groups(&self) -> impl Iterator<Item = &VideoKey> {
        self.groups
            .iter()
            .filter(|(_, outcome)| outcome.is_skipped())
            .map(|(key, _)| key)
    }

    /// Videos read through to their last target, or to their end when dumped.
    pub fn completed_groups(&self) -> usize {
        self.groups
            .iter()
            .filter(|(_, outcome)| matches!(outcome, GroupOutcome::Completed { .. }))
            .count()
    }

    /// Outcome recorded for `key`, if it was processed.
    pub fn outcome(&self, key: &VideoKey) -> Option<&GroupOutcome> {
        self.groups
            .iter()
            .find(|(group_key, _)| group_key == key)
            .map(|(_, outcome)| outcome)
    }
}

/// Group records by source video, in order of first appearance.
pub fn group_by_video<'r, I>(images: I) -> (Vec<(VideoKey, Vec<&'r ImageRecord>)>, u64)
where
    I: IntoIterator<Item = &'r ImageRecord>,
{
    let mut groups: Vec<(VideoKey, Vec<&ImageRecord>)> = Vec::new();
    let mut positions: HashMap<VideoKey, usize> = HashMap::new();
    let mut without_video = 0_u64;

    for image in images {
        let Some(key) = VideoKey::from_image(image) else {
            log::debug!("Image {} names no source video, not extracted", image.id());
            without_video += 1;
            continue;
        };

        match positions.get(&key) {
            Some(&index) => groups[index].1.push(image),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, vec![image]));
            }
        }
    }

    (groups, without_video)
}

/// Writes the frames referenced by image records out of their source videos.
///
/// Generic over the [`VideoOpener`] so the scan can run against any
/// [`FrameSource`]; [`FrameExtractor::new`] uses FFmpeg.
#[derive(Debug, Clone)]
pub struct FrameExtractor<O = FfmpegOpener> {
    opener: O,
    videos_dir: PathBuf,
    output_dir: PathBuf,
    options: ExtractOptions,
}

impl FrameExtractor<FfmpegOpener> {
    pub fn new(videos_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self::with_opener(FfmpegOpener, videos_dir, output_dir)
    }
}

impl<O: VideoOpener> FrameExtractor<O> {
    pub fn with_opener(
        opener: O,
        videos_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            opener,
            videos_dir: videos_dir.into(),
            output_dir: output_dir.into(),
            options: ExtractOptions::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Extract the frames of `images`.
    ///
    /// Never fails: every problem is logged and recorded in the returned
    /// report, and the remaining videos are still processed.
    pub fn extract<'r, I>(&self, images: I) -> ExtractionReport
    where
        I: IntoIterator<Item = &'r ImageRecord>,
    {
        if let Err(error) = fs::create_dir_all(&self.output_dir) {
            log::warn!(
                "Cannot create output directory {}: {error}",
                self.output_dir.display()
            );
        }

        let (groups, records_without_video) = group_by_video(images);
        let mut report = ExtractionReport {
            records_without_video,
            ..ExtractionReport::default()
        };

        for (key, records) in groups {
            let outcome = self.extract_group(&key, &records, &mut report);
            report.groups.push((key, outcome));
        }

        report
    }

    /// Write every frame of every encoding of `sequences`.
    ///
    /// Each sequence is dumped for every distortion on its allow-list and
    /// every level in [`SEVERITY_LEVELS`]. Frame `n` (1-based) of a video is
    /// written as [`VideoKey::dumped_frame_name`] directly below the output
    /// directory. Sequences without an allow-list are skipped; like
    /// [`extract`](Self::extract), this never fails.
    pub fn dump_all(
        &self,
        sequences: &SequenceManifest,
        allow_lists: &AllowLists,
    ) -> ExtractionReport {
        if let Err(error) = fs::create_dir_all(&self.output_dir) {
            log::warn!(
                "Cannot create output directory {}: {error}",
                self.output_dir.display()
            );
        }

        let mut report = ExtractionReport::default();
        for sequence in sequences.names() {
            let Some(list) = allow_lists.get(sequence).filter(|list| !list.is_empty()) else {
                log::warn!("No distortions found for {sequence}, skipping");
                continue;
            };
            log::info!("Dumping {sequence} with distortions {:?}", list.labels());

            for distortion in list.labels() {
                for level in SEVERITY_LEVELS {
                    let key = VideoKey::new(sequence.as_str(), distortion.as_str(), level.to_string());
                    let outcome = self.dump_video(&key, &mut report);
                    report.groups.push((key, outcome));
                }
            }
        }

        report
    }

    fn dump_video(&self, key: &VideoKey, report: &mut ExtractionReport) -> GroupOutcome {
        let video_path = key.video_path(&self.videos_dir);
        if !video_path.exists() {
            log::warn!("Video not found: {}", video_path.display());
            return GroupOutcome::MissingVideo;
        }

        let mut source = match self.opener.open(&video_path) {
            Ok(source) => source,
            Err(error) => {
                log::warn!("Unable to open video {}: {error}", video_path.display());
                return GroupOutcome::OpenFailed {
                    reason: error.to_string(),
                };
            }
        };

        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            key.to_string(),
            source.frame_count_hint(),
            self.options.batch_size,
        );
        let mut position = 0_u64;
        let mut frames_written = 0_u64;

        let outcome = loop {
            match source.advance() {
                Ok(true) => {}
                Ok(false) => break GroupOutcome::Completed { frames_written },
                Err(error) => {
                    log::warn!("Decoding {key} failed at frame {position}: {error}");
                    break GroupOutcome::DecodeFailed {
                        position,
                        frames_written,
                        reason: error.to_string(),
                    };
                }
            }
            report.frames_decoded += 1;
            tracker.advance();
            position += 1;

            let output_path = self.output_dir.join(key.dumped_frame_name(position));
            let written = source.current_frame().and_then(|image| {
                write_jpeg(&image, &output_path, self.options.jpeg_quality)
            });
            match written {
                Ok(()) => {
                    frames_written += 1;
                    tracker.wrote(1);
                }
                Err(error) => {
                    log::warn!("Cannot write {}: {error}", output_path.display());
                    report.write_failures += 1;
                }
            }
        };

        tracker.finish();
        report.frames_written += frames_written;
        log::info!("{frames_written} frames extracted for {key}");
        outcome
    }

    fn extract_group(
        &self,
        key: &VideoKey,
        records: &[&ImageRecord],
        report: &mut ExtractionReport,
    ) -> GroupOutcome {
        let video_path = key.video_path(&self.videos_dir);
        if !video_path.exists() {
            log::warn!("Video not found: {}", video_path.display());
            return GroupOutcome::MissingVideo;
        }

        let mut targets: BTreeMap<FrameTarget, Vec<&ImageRecord>> = BTreeMap::new();
        for &record in records {
            match FrameTarget::from_image(record) {
                Some(target) => targets.entry(target).or_default().push(record),
                None => {
                    log::debug!(
                        "Image {} has no frame index in its file name, not extracted",
                        record.id()
                    );
                    report.records_without_target += 1;
                }
            }
        }

        if targets.is_empty() {
            log::info!("No frame to extract for {key}");
            return GroupOutcome::NoTargets;
        }

        let mut source = match self.opener.open(&video_path) {
            Ok(source) => source,
            Err(error) => {
                log::warn!("Unable to open video {}: {error}", video_path.display());
                return GroupOutcome::OpenFailed {
                    reason: error.to_string(),
                };
            }
        };

        let total = source.frame_count_hint();
        log::info!("Extracting frames for {key} ({} images)", records.len());
        match total {
            Some(total) => log::info!("Frames to extract: {} / {total}", targets.len()),
            None => log::info!("Frames to extract: {}", targets.len()),
        }

        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            key.to_string(),
            total,
            self.options.batch_size,
        );
        let mut queue = targets.into_iter();
        let mut next_target = queue.next();
        let mut position = 0_u64;
        let mut frames_written = 0_u64;

        let outcome = loop {
            let Some((target, matching)) = &next_target else {
                break GroupOutcome::Completed { frames_written };
            };

            match source.advance() {
                Ok(true) => {}
                Ok(false) => {
                    log::warn!("End of video {key} reached prematurely at frame {position}");
                    break GroupOutcome::PrematureEnd {
                        position,
                        frames_written,
                    };
                }
                Err(error) => {
                    log::warn!("Decoding {key} failed at frame {position}: {error}");
                    break GroupOutcome::DecodeFailed {
                        position,
                        frames_written,
                        reason: error.to_string(),
                    };
                }
            }
            report.frames_decoded += 1;
            tracker.advance();

            if position == target.index() {
                log::trace!("Frame {position} matches {} image(s)", matching.len());
                let written = self.write_matches(&mut source, matching, report);
                frames_written += written;
                tracker.wrote(written);
                next_target = queue.next();
            }

            position += 1;
        };

        tracker.finish();
        report.frames_written += frames_written;
        if let GroupOutcome::Completed { .. } = outcome {
            log::info!("Extraction complete for {key}");
        }
        outcome
    }

    /// Write the current frame of `source` once per record in `matching`.
    fn write_matches<S: FrameSource>(
        &self,
        source: &mut S,
        matching: &[&ImageRecord],
        report: &mut ExtractionReport,
    ) -> u64 {
        let image = match source.current_frame() {
            Ok(image) => image,
            Err(error) => {
                log::warn!("Cannot convert decoded frame: {error}");
                report.write_failures += matching.len() as u64;
                return 0;
            }
        };

        let mut written = 0;
        for record in matching {
            // Records in `matching` all parsed a frame index, so they have a name.
            let Some(file_name) = record.file_name() else {
                continue;
            };

            let output_path = self.output_dir.join(file_name);
            match write_jpeg(&image, &output_path, self.options.jpeg_quality) {
                Ok(()) => {
                    log::debug!("Image written: {}", output_path.display());
                    written += 1;
                }
                Err(error) => {
                    log::warn!("Cannot write {}: {error}", output_path.display());
                    report.write_failures += 1;
                }
            }
        }
        written
    }
}

/// Encode `image` as JPEG at `path`, creating parent directories as needed.
pub fn write_jpeg(image: &RgbImage, path: &Path, quality: u8) -> Result<(), FramePickError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    JpegEncoder::new_with_quality(&mut writer, quality).encode_image(image)?;
    writer.flush()?;
    Ok(())
}
