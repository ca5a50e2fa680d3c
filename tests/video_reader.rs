//! FFmpeg-backed reader integration tests.
//!
//! Tests that decode real video require fixture files from
//! `tests/fixtures/generate_fixtures.sh`.

use std::{fs, path::Path};

use framepick::{
    AnnotationCollection, FrameExtractor, FramePickError, FrameSource, GroupOutcome, VideoKey,
    VideoReader,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

// ── opening ────────────────────────────────────────────────────────

#[test]
fn open_nonexistent_file() {
    let result = VideoReader::open("tests/fixtures/does_not_exist.mp4");
    assert!(matches!(result, Err(FramePickError::VideoOpen { .. })));
}

#[test]
fn open_garbage_file() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = directory.path().join("garbage.mp4");
    fs::write(&path, b"definitely not an mp4 container").unwrap();

    assert!(VideoReader::open(&path).is_err());
}

// ── sequential decoding ────────────────────────────────────────────

#[test]
fn advances_through_every_frame() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut reader = VideoReader::open(path).expect("Failed to open fixture");
    let hint = reader.frame_count_hint();

    let mut decoded = 0_u64;
    while reader.advance().expect("Failed to decode") {
        decoded += 1;
    }

    assert!(decoded > 0);
    if let Some(hint) = hint {
        // Header counts can be approximate.
        assert!(decoded.abs_diff(hint) <= 2, "decoded {decoded}, header {hint}");
    }
    // Exhausted sources stay exhausted.
    assert!(!reader.advance().unwrap());
}

#[test]
fn current_frame_matches_stream_dimensions() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut reader = VideoReader::open(path).expect("Failed to open fixture");
    assert!(reader.current_frame().is_err(), "no frame before advance");

    assert!(reader.advance().unwrap());
    let frame = reader.current_frame().expect("Failed to convert frame");
    assert_eq!(frame.width(), reader.width());
    assert_eq!(frame.height(), reader.height());
}

// ── extraction over a real video ───────────────────────────────────

#[test]
fn extracts_frames_from_real_video() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let directory = root.path().join("videos/seq1");
    fs::create_dir_all(&directory).unwrap();
    fs::copy(path, directory.join("seq1_blur_1.mp4")).unwrap();

    let global = AnnotationCollection::from_json_str(
        r#"{"images": [
            {"id": 1, "video_name": "seq1", "distortion_type": "blur", "severity_level": 1,
             "file_name": "seq1_blur_1_frame_0000.jpg"},
            {"id": 2, "video_name": "seq1", "distortion_type": "blur", "severity_level": 1,
             "file_name": "seq1_blur_1_frame_0005.jpg"}
        ], "annotations": []}"#,
    )
    .unwrap();

    let report = FrameExtractor::new(root.path().join("videos"), root.path().join("frames"))
        .extract(&global.images);

    assert_eq!(
        report.outcome(&VideoKey::new("seq1", "blur", "1")),
        Some(&GroupOutcome::Completed { frames_written: 2 })
    );
    for name in ["seq1_blur_1_frame_0000.jpg", "seq1_blur_1_frame_0005.jpg"] {
        let written = image::open(root.path().join("frames").join(name))
            .expect("Failed to read extracted frame");
        assert!(written.width() > 0);
    }
}
