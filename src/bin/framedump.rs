use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use colored::Colorize;
use framepick::{
    DumpSummary, ExtractOptions, FfmpegLogLevel, PipelineConfig, TerminalProgress,
    configuration::DEFAULT_JPEG_QUALITY,
};

const CLI_AFTER_HELP: &str = "Examples:\n  framedump --sequence-list-path name_txt_.txt --distortion-dir distortion_type_ \\\n    --videos-dir distorted_video --output-dir dist --progress";

/// Write every frame of every distorted encoding of a list of sequences.
///
/// Frames are named `<sequence>_<distortion>_lvl<level>_frame_<NNNN>.jpg`,
/// numbered from 1, for levels 1 to 4 of every allowed distortion.
#[derive(Debug, Parser)]
#[command(name = "framedump", version, after_help = CLI_AFTER_HELP)]
struct Cli {
    /// Text file listing the sequences, one per line.
    #[arg(long)]
    sequence_list_path: PathBuf,

    /// Directory holding one `<sequence>.txt` distortion list per sequence.
    #[arg(long)]
    distortion_dir: PathBuf,

    /// Root directory of the source videos.
    #[arg(long)]
    videos_dir: PathBuf,

    /// Where frames are written.
    #[arg(long)]
    output_dir: PathBuf,

    /// Show debug logging output.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar per video.
    #[arg(long)]
    progress: bool,

    /// JPEG quality of written frames (1-100).
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

        PipelineConfig::new("dump")
            .with_sequence_list_path(&self.sequence_list_path)
            .with_distortion_dir(&self.distortion_dir)
            .with_videos_dir(&self.videos_dir)
            .with_output_frames_dir(&self.output_dir)
            .with_extract_options(options)
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn print_summary(summary: &DumpSummary, cli: &Cli) {
    let report = &summary.extraction;

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

    let missing = report.skipped_groups().count();
    if missing > 0 {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("{missing} video(s) missing or unreadable").yellow()
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
            "Wrote {} frame(s) from {} complete video(s) to {}",
            report.frames_written,
            report.completed_groups(),
            cli.output_dir.display()
        )
        .green()
    );
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    framepick::set_ffmpeg_log_level(cli.ffmpeg_log_level);

    let summary = framepick::dump_frames(&cli.pipeline_config())?;
    print_summary(&summary, &cli);
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
