//! Shared fixtures for the integration tests.
//!
//! Videos are simulated: a "video" file holds its frame count as text and
//! [`SyntheticOpener`] turns it into a [`FrameSource`] whose frame `i` is a
//! solid colour derived from `i`, so a written JPEG can be traced back to the
//! frame it came from. A second number makes decoding fail at that frame.

#![allow(dead_code)]

use std::{
    fs,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use framepick::{AnnotationCollection, FramePickError, FrameSource, VideoOpener};
use image::{Rgb, RgbImage};
use serde_json::Value;

pub const FRAME_SIZE: u32 = 16;

/// Colour of synthetic frame `index`.
pub fn frame_color(index: u64) -> Rgb<u8> {
    Rgb([(index * 20 % 250) as u8, 128, 64])
}

/// Counts shared between an opener and the test that owns it.
#[derive(Debug, Clone, Default)]
pub struct Counters {
    pub opened: Arc<AtomicU64>,
    pub decoded: Arc<AtomicU64>,
    pub converted: Arc<AtomicU64>,
}

impl Counters {
    pub fn opened(&self) -> u64 {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn decoded(&self) -> u64 {
        self.decoded.load(Ordering::SeqCst)
    }

    pub fn converted(&self) -> u64 {
        self.converted.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyntheticOpener {
    pub counters: Counters,
}

pub struct SyntheticVideo {
    frames: u64,
    fail_at: Option<u64>,
    next: u64,
    current: Option<u64>,
    counters: Counters,
}

impl VideoOpener for SyntheticOpener {
    type Source = SyntheticVideo;

    fn open(&self, path: &Path) -> Result<SyntheticVideo, FramePickError> {
        let contents = fs::read_to_string(path)?;
        let not_synthetic = || FramePickError::VideoOpen {
            path: path.to_path_buf(),
            reason: "not a synthetic video".to_string(),
        };
        let mut numbers = contents.split_whitespace().map(str::parse::<u64>);
        let frames = numbers
            .next()
            .and_then(Result::ok)
            .ok_or_else(not_synthetic)?;
        let fail_at = match numbers.next() {
            Some(value) => Some(value.map_err(|_| not_synthetic())?),
            None => None,
        };

        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(SyntheticVideo {
            frames,
            fail_at,
            next: 0,
            current: None,
            counters: self.counters.clone(),
        })
    }
}

impl FrameSource for SyntheticVideo {
    fn advance(&mut self) -> Result<bool, FramePickError> {
        if self.fail_at == Some(self.next) {
            self.current = None;
            return Err(FramePickError::VideoDecodeError(format!(
                "corrupt packet at frame {}",
                self.next
            )));
        }
        if self.next >= self.frames {
            self.current = None;
            return Ok(false);
        }
        self.current = Some(self.next);
        self.next += 1;
        self.counters.decoded.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    fn current_frame(&mut self) -> Result<RgbImage, FramePickError> {
        let index = self
            .current
            .ok_or_else(|| FramePickError::VideoDecodeError("no current frame".to_string()))?;
        self.counters.converted.fetch_add(1, Ordering::SeqCst);
        Ok(RgbImage::from_pixel(FRAME_SIZE, FRAME_SIZE, frame_color(index)))
    }

    fn frame_count_hint(&self) -> Option<u64> {
        Some(self.frames)
    }
}

/// Create a synthetic video of `frames` frames for `sequence` under `videos_dir`.
pub fn write_video(videos_dir: &Path, sequence: &str, distortion: &str, level: u32, frames: u64) {
    let directory = videos_dir.join(sequence);
    fs::create_dir_all(&directory).unwrap();
    fs::write(
        directory.join(format!("{sequence}_{distortion}_{level}.mp4")),
        frames.to_string(),
    )
    .unwrap();
}

/// Like [`write_video`], but decoding fails when frame `fail_at` is reached.
pub fn write_corrupt_video(
    videos_dir: &Path,
    sequence: &str,
    distortion: &str,
    level: u32,
    frames: u64,
    fail_at: u64,
) {
    let directory = videos_dir.join(sequence);
    fs::create_dir_all(&directory).unwrap();
    fs::write(
        directory.join(format!("{sequence}_{distortion}_{level}.mp4")),
        format!("{frames} {fail_at}"),
    )
    .unwrap();
}

/// Build an image JSON object.
pub fn image(id: u64, sequence: &str, distortion: &str, level: u32, frame: &str) -> Value {
    serde_json::json!({
        "id": id,
        "width": FRAME_SIZE,
        "height": FRAME_SIZE,
        "video_name": sequence,
        "distortion_type": distortion,
        "severity_level": level,
        "file_name": format!("{sequence}_{distortion}_{level}_frame_{frame}.jpg"),
    })
}

pub fn annotation(id: u64, image_id: u64) -> Value {
    serde_json::json!({
        "id": id,
        "image_id": image_id,
        "category_id": 1,
        "bbox": [1.0, 2.0, 3.0, 4.0],
    })
}

pub fn collection(images: Vec<Value>, annotations: Vec<Value>) -> AnnotationCollection {
    let json = serde_json::json!({
        "licenses": [{"id": 1, "name": "internal"}],
        "categories": [{"id": 1, "name": "object"}],
        "images": images,
        "annotations": annotations,
    });
    AnnotationCollection::from_json_str(&json.to_string()).unwrap()
}

/// Assert that the JPEG at `path` holds synthetic frame `index`.
pub fn assert_frame(path: &Path, index: u64) {
    let decoded = image::open(path)
        .unwrap_or_else(|error| panic!("cannot read {}: {error}", path.display()))
        .to_rgb8();
    let pixel = decoded.get_pixel(FRAME_SIZE / 2, FRAME_SIZE / 2);
    let expected = frame_color(index);

    for channel in 0..3 {
        let difference = (i32::from(pixel[channel]) - i32::from(expected[channel])).abs();
        assert!(
            difference <= 8,
            "{} holds {pixel:?}, expected frame {index} ({expected:?})",
            path.display()
        );
    }
}

/// Every file below `root`, as paths relative to it, sorted.
pub fn files_below(root: &Path) -> Vec<String> {
    fn walk(root: &Path, directory: &Path, found: &mut Vec<String>) {
        let Ok(entries) = fs::read_dir(directory) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                walk(root, &path, found);
            } else {
                let relative = path.strip_prefix(root).unwrap();
                found.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }
    }

    let mut found = Vec::new();
    walk(root, root, &mut found);
    found.sort();
    found
}
