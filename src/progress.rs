//! Progress reporting.
//!
//! The extractor reports one [`ProgressInfo`] snapshot per decoded frame (or
//! per batch, see [`ExtractOptions::with_batch_size`](crate::ExtractOptions))
//! and a final one when it leaves a video, whichever way it leaves.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framepick::{ExtractOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{}] {pct:.1}%", info.video);
//!         }
//!     }
//! }
//!
//! let options = ExtractOptions::new().with_progress(Arc::new(PrintProgress));
//! ```

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use indicatif::{ProgressBar, ProgressStyle};

/// A snapshot of extraction progress within one video.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Display name of the video being read (`seq/seq_dist_level`).
    pub video: String,
    /// Frames decoded so far in this video.
    pub current: u64,
    /// Frame count the container advertises, if any.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Image files written so far for this video.
    pub frames_written: u64,
    /// Wall-clock time spent on this video.
    pub elapsed: Duration,
    /// `true` on the last report for this video.
    pub finished: bool,
}

/// Receives progress updates during extraction.
///
/// Callbacks observe the run; they cannot stop it.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards every notification. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Draws one `indicatif` bar per video, replaced when the extractor moves on.
///
/// The bar's length is the container's frame count when known; otherwise a
/// spinner is shown.
#[derive(Default)]
pub struct TerminalProgress {
    current: Mutex<Option<(String, ProgressBar)>>,
}

fn video_bar(info: &ProgressInfo) -> ProgressBar {
    let bar = match info.total {
        Some(total) => ProgressBar::new(total),
        None => ProgressBar::new_spinner(),
    };
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.green} {prefix} {bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("##-"));
    }
    bar.set_prefix(info.video.clone());
    bar
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };

        if current.as_ref().is_none_or(|(video, _)| *video != info.video) {
            if let Some((_, bar)) = current.take() {
                bar.finish_and_clear();
            }
            *current = Some((info.video.clone(), video_bar(info)));
        }

        if let Some((_, bar)) = current.as_ref() {
            bar.set_position(info.current);
            bar.set_message(format!("{} written", info.frames_written));
            if info.finished {
                bar.finish();
            }
        }

        if info.finished {
            *current = None;
        }
    }
}

/// Tracks per-video progress and fires the callback every `batch_size`
/// decoded frames.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    video: String,
    total: Option<u64>,
    current: u64,
    frames_written: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        video: String,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            video,
            total,
            current: 0,
            frames_written: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one decoded frame.
    pub(crate) fn advance(&mut self) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report(false);
            self.items_since_last_report = 0;
        }
    }

    /// Record written image files.
    pub(crate) fn wrote(&mut self, count: u64) {
        self.frames_written += count;
    }

    /// Emit the closing report for this video.
    pub(crate) fn finish(&mut self) {
        self.report(true);
    }

    fn report(&self, finished: bool) {
        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (self.current as f32 / total as f32) * 100.0);

        self.callback.on_progress(&ProgressInfo {
            video: self.video.clone(),
            current: self.current,
            total: self.total,
            percentage,
            frames_written: self.frames_written,
            elapsed: self.start_time.elapsed(),
            finished,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recording(Mutex<Vec<ProgressInfo>>);

    impl ProgressCallback for Recording {
        fn on_progress(&self, info: &ProgressInfo) {
            self.0.lock().unwrap().push(info.clone());
        }
    }

    #[test]
    fn batches_reports_and_always_finishes() {
        let recording = Arc::new(Recording::default());
        let mut tracker = ProgressTracker::new(recording.clone(), "v".into(), Some(10), 4);

        for _ in 0..9 {
            tracker.advance();
        }
        tracker.wrote(2);
        tracker.finish();

        let infos = recording.0.lock().unwrap();
        let currents: Vec<u64> = infos.iter().map(|info| info.current).collect();
        assert_eq!(currents, [4, 8, 9]);
        assert!(infos.last().unwrap().finished);
        assert_eq!(infos.last().unwrap().frames_written, 2);
        let percentage = infos.last().unwrap().percentage.unwrap();
        assert!((percentage - 90.0).abs() < 0.01);
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        let recording = Arc::new(Recording::default());
        let mut tracker = ProgressTracker::new(recording.clone(), "v".into(), None, 0);
        tracker.advance();
        tracker.advance();
        assert_eq!(recording.0.lock().unwrap().len(), 2);
    }
}
