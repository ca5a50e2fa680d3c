use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use colored::Colorize;
use framepick::{
    ExtractOptions, ExtractionReport, FfmpegLogLevel, GroupOutcome, PipelineConfig, RunSummary,
    TerminalProgress, configuration::DEFAULT_JPEG_QUALITY,
};

const CLI_AFTER_HELP: &str = "Examples:\n  framepick --set test --global-json-path global.json --sequence-list-path test.txt \\\n    --distortion-dir distortion_type_ --videos-dir distorted_video \\\n    --output-json-path test.json --output-frames-dir frames --extract-frames --progress";

#[derive(Debug, Parser)]
#[command(
    name = "framepick",
    version,
    about = "Select a dataset split from a global annotation file and extract its frames",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Name of the split to build (e.g. train, test).
    #[arg(long)]
    set: String,

    /// Global annotation JSON file.
    #[arg(long)]
    global_json_path: PathBuf,

    /// Text file listing the sequences of the split, one per line.
    #[arg(long)]
    sequence_list_path: PathBuf,

    /// Directory holding one `<sequence>.txt` distortion list per sequence.
    #[arg(long)]
    distortion_dir: PathBuf,

    /// Root directory of the source videos.
    #[arg(long)]
    videos_dir: PathBuf,

    /// Where the filtered annotation JSON is written.
    #[arg(long)]
    output_json_path: PathBuf,

    /// Where extracted frames are written.
    #[arg(long)]
    output_frames_dir: PathBuf,

    /// Extract the selected frames from the source videos.
    #[arg(long)]
    extract_frames: bool,

    /// Show debug logging output.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar per video during extraction.
    #[arg(long)]
    progress: bool,

    /// JPEG quality of extracted frames (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, default_value_t = FfmpegLogLevel::Error)]
    ffmpeg_log_level: FfmpegLogLevel,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        let mut options = ExtractOptions::new().with_jpeg_quality(self.jpeg_quality);
        if self.progress {
            options = options.with_progress(Arc::new(TerminalProgress::default()));
        }

        PipelineConfig::new(&self.set)
            .with_global_json_path(&self.global_json_path)
            .with_sequence_list_path(&self.sequence_list_path)
            .with_distortion_dir(&self.distortion_dir)
            .with_videos_dir(&self.videos_dir)
            .with_output_json_path(&self.output_json_path)
            .with_output_frames_dir(&self.output_frames_dir)
            .with_extract_frames(self.extract_frames)
            .with_extract_options(options)
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn print_summary(summary: &RunSummary, cli: &Cli) {
    println!(
        "{} {}",
        "success:".green().bold(),
        format!(
            "{} images and {} annotations selected for '{}' -> {}",
            summary.images_selected,
            summary.annotations_selected,
            summary.set,
            cli.output_json_path.display()
        )
        .green()
    );

    if !summary.skipped_sequences.is_empty() {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!(
                "{} sequence(s) had no distortion list: {}",
                summary.skipped_sequences.len(),
                summary.skipped_sequences.join(", ")
            )
            .yellow()
        );
    }

    let Some(report) = &summary.extraction else {
        return;
    };

    let skipped: Vec<String> = report.skipped_groups().map(ToString::to_string).collect();
    if !skipped.is_empty() {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("{} video(s) skipped: {}", skipped.len(), skipped.join(", ")).yellow()
        );
    }
    let incomplete = incomplete_groups(report);
    if !incomplete.is_empty() {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!(
                "{} video(s) ended before their last frame: {}",
                incomplete.len(),
                incomplete.join(", ")
            )
            .yellow()
        );
    }
    if report.write_failures > 0 {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("{} frame file(s) could not be written", report.write_failures).yellow()
        );
    }

    println!(
        "{} {}",
        "success:".green().bold(),
        format!(
            "Extracted {} frame(s) from {} complete video(s) to {}",
            report.frames_written,
            report.completed_groups(),
            cli.output_frames_dir.display()
        )
        .green()
    );
}

/// Videos whose stream ended or failed before every target was written.
fn incomplete_groups(report: &ExtractionReport) -> Vec<String> {
    report
        .groups
        .iter()
        .filter(|(_, outcome)| {
            matches!(
                outcome,
                GroupOutcome::PrematureEnd { .. } | GroupOutcome::DecodeFailed { .. }
            )
        })
        .map(|(key, _)| key.to_string())
        .collect()
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    framepick::set_ffmpeg_log_level(cli.ffmpeg_log_level);

    let summary = framepick::run(&cli.pipeline_config())?;
    print_summary(&summary, &cli);
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
