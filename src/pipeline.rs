//! The select-then-extract run.
//!
//! [`run`] loads the split definition, selects the matching subset of the
//! global annotation file, writes it, and optionally extracts the subset's
//! frames. Data only flows forward: extraction never changes what was
//! selected, and an image whose frame could not be extracted stays in the
//! written annotation file.
//!
//! [`dump_frames`] is the bulk alternative used to produce the per-frame
//! images in the first place: no annotation file is involved, and every
//! frame of every encoding of the split's sequences is written.

use crate::{
    annotation::AnnotationCollection,
    configuration::PipelineConfig,
    decoder::{FfmpegOpener, VideoOpener},
    error::FramePickError,
    extractor::{ExtractionReport, FrameExtractor},
    manifest::{AllowLists, SequenceManifest, load_allow_lists},
    selector::select,
};

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub set: String,
    pub images_selected: usize,
    pub annotations_selected: usize,
    /// Manifest sequences dropped for lack of an allow-list.
    pub skipped_sequences: Vec<String>,
    /// Present when frame extraction was enabled.
    pub extraction: Option<ExtractionReport>,
}

/// What a frame dump did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpSummary {
    pub set: String,
    /// Manifest sequences dropped for lack of an allow-list.
    pub skipped_sequences: Vec<String>,
    pub extraction: ExtractionReport,
}

fn skipped_sequences(manifest: &SequenceManifest, allow_lists: &AllowLists) -> Vec<String> {
    manifest
        .names()
        .iter()
        .filter(|name| allow_lists.get(*name).is_none_or(|list| list.is_empty()))
        .cloned()
        .collect()
}

/// Run the pipeline described by `config`, decoding videos with FFmpeg.
///
/// # Errors
///
/// Fails only on configuration-level problems: a missing or empty sequence
/// manifest, an unreadable global annotation file, or an unwritable output
/// annotation file. Extraction problems are reported in
/// [`RunSummary::extraction`].
pub fn run(config: &PipelineConfig) -> Result<RunSummary, FramePickError> {
    run_with_opener(config, FfmpegOpener)
}

/// Run the pipeline with a custom [`VideoOpener`].
pub fn run_with_opener<O: VideoOpener>(
    config: &PipelineConfig,
    opener: O,
) -> Result<RunSummary, FramePickError> {
    log::info!("Preparing split '{}'", config.set);

    let manifest = SequenceManifest::load(&config.sequence_list_path)?;
    let global = AnnotationCollection::load(&config.global_json_path)?;
    let allow_lists = load_allow_lists(&config.distortion_dir, &manifest);

    let subset = select(&global, &manifest, &allow_lists);
    subset.save(&config.output_json_path)?;
    log::info!(
        "Filtered annotation file saved: {}",
        config.output_json_path.display()
    );

    let skipped_sequences = skipped_sequences(&manifest, &allow_lists);

    let extraction = config.extract_frames.then(|| {
        log::info!("Extracting frames from the videos");
        let report = FrameExtractor::with_opener(
            opener,
            &config.videos_dir,
            &config.output_frames_dir,
        )
        .with_options(config.extract_options.clone())
        .extract(subset.images.iter().copied());
        log::info!(
            "Frames extracted to: {}",
            config.output_frames_dir.display()
        );
        report
    });

    Ok(RunSummary {
        set: config.set.clone(),
        images_selected: subset.images.len(),
        annotations_selected: subset.annotations.len(),
        skipped_sequences,
        extraction,
    })
}

/// Write every frame of every encoding of the split's sequences, decoding
/// videos with FFmpeg.
///
/// Only the sequence manifest, the distortion directory, the videos
/// directory, the frames directory and the extract options of `config` are
/// used.
///
/// # Errors
///
/// Fails only when the sequence manifest is missing or empty.
pub fn dump_frames(config: &PipelineConfig) -> Result<DumpSummary, FramePickError> {
    dump_frames_with_opener(config, FfmpegOpener)
}

/// [`dump_frames`] with a custom [`VideoOpener`].
pub fn dump_frames_with_opener<O: VideoOpener>(
    config: &PipelineConfig,
    opener: O,
) -> Result<DumpSummary, FramePickError> {
    log::info!("Dumping every frame of split '{}'", config.set);

    let manifest = SequenceManifest::load(&config.sequence_list_path)?;
    let allow_lists = load_allow_lists(&config.distortion_dir, &manifest);

    let extraction =
        FrameExtractor::with_opener(opener, &config.videos_dir, &config.output_frames_dir)
            .with_options(config.extract_options.clone())
            .dump_all(&manifest, &allow_lists);
    log::info!(
        "Extraction and renaming completed: {}",
        config.output_frames_dir.display()
    );

    Ok(DumpSummary {
        set: config.set.clone(),
        skipped_sequences: skipped_sequences(&manifest, &allow_lists),
        extraction,
    })
}
