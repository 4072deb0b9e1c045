use std::{
    error::Error,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use slide_extract::{
    DEFAULT_THRESHOLD, ExportEvent, ExtractOptions, ProgressCallback, ProgressInfo, Roi,
};

const CLI_AFTER_HELP: &str = "Select a comparison region (e.g. the slide number) for faster and more\naccurate extraction.\n\nExamples:\n  slide-extract talk.mp4 slides/talk_\n  slide-extract -r 1180.680:80x30 -t 0.995 talk.mp4 slides/talk_\n  slide-extract -g talk.mp4 slides/talk_";

#[derive(Debug, Parser)]
#[command(
    name = "slide-extract",
    version,
    about = "Extract slides from video",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Launch a preview window to set the comparison region, press any key when done.
    #[arg(short = 'g', long = "gui", conflicts_with = "region")]
    gui: bool,

    /// Manually set the comparison region: starting point X.Y, width and height WxH.
    #[arg(short = 'r', long = "region", value_name = "X.Y:WxH", value_parser = parse_region)]
    region: Option<Roi>,

    /// Comparison threshold in (0, 1]; a frame at or below it is a new slide.
    #[arg(
        short = 't',
        long = "threshold",
        value_name = "THRESH",
        default_value_t = DEFAULT_THRESHOLD,
        value_parser = parse_threshold
    )]
    threshold: f64,

    /// Print the run summary as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Show a progress spinner while decoding.
    #[arg(long)]
    progress: bool,

    /// Suppress per-frame diagnostics.
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Input video.
    infile: PathBuf,

    /// Output prefix (directory and file-name stem) for written slides.
    outprefix: String,
}

fn parse_region(value: &str) -> Result<Roi, String> {
    value.parse::<Roi>().map_err(|error| error.to_string())
}

fn parse_threshold(value: &str) -> Result<f64, String> {
    let threshold = value
        .trim()
        .parse::<f64>()
        .map_err(|_| "Threshold must be between 0 and 1".to_string())?;
    slide_extract::validate_threshold(threshold)
        .map_err(|_| "Threshold must be between 0 and 1".to_string())
}

#[cfg(feature = "gui")]
fn select_region(input: &Path) -> Result<Roi, Box<dyn Error>> {
    let roi = slide_extract::select_roi(input)?;
    println!("Selected ROI: {roi}");
    Ok(roi)
}

#[cfg(not(feature = "gui"))]
fn select_region(_input: &Path) -> Result<Roi, Box<dyn Error>> {
    Err("-g requires building with the `gui` feature".into())
}

/// Prints per-frame diagnostics and drives the optional spinner.
struct TerminalProgress {
    verbose: bool,
    bar: Option<ProgressBar>,
}

impl TerminalProgress {
    fn new(verbose: bool, show_bar: bool) -> Result<Self, Box<dyn Error>> {
        let bar = if show_bar {
            let bar = ProgressBar::new_spinner();
            bar.set_style(ProgressStyle::with_template(
                "{spinner:.green} {pos} frames decoded, {msg}",
            )?);
            Some(bar)
        } else {
            None
        };
        Ok(Self { verbose, bar })
    }

    fn line(&self, message: String) {
        match &self.bar {
            Some(bar) => bar.println(message),
            None => println!("{message}"),
        }
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(bar) = &self.bar {
            bar.set_position(info.frames_processed);
            bar.set_message(format!("{} slide(s)", info.exported));
        }
    }

    fn on_export(&self, event: &ExportEvent) {
        if !self.verbose {
            return;
        }

        match event {
            ExportEvent::Attempt {
                path,
                format,
                width,
                height,
            } => {
                self.line(format!("Attempting to write file: {}", path.display()));
                self.line(format!("Image size: {width}x{height}"));
                self.line(format!("Image type: RGB8 as {format}"));
            }
            ExportEvent::Written { path, format } => {
                self.line(
                    format!("Successfully wrote {format} image: {}", path.display())
                        .green()
                        .to_string(),
                );
            }
            ExportEvent::Failed {
                path,
                format,
                reason,
            } => {
                let message = format!("Failed to write {format} image: {} ({reason})", path.display());
                match &self.bar {
                    Some(bar) => bar.println(message.red().to_string()),
                    None => eprintln!("{}", message.red()),
                }
            }
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let roi = if cli.gui {
        Some(select_region(&cli.infile)?)
    } else {
        cli.region
    };

    let progress = Arc::new(TerminalProgress::new(!cli.quiet && !cli.json, cli.progress)?);
    let mut options = ExtractOptions::new()
        .with_threshold(cli.threshold)
        .with_progress(progress.clone())
        .with_batch_size(25);
    if let Some(roi) = roi {
        options = options.with_roi(roi);
    }

    let result = slide_extract::extract_slides(&cli.infile, &cli.outprefix, &options);
    progress.finish();
    let summary = result?;

    if cli.json {
        let payload = json!({
            "input": cli.infile.display().to_string(),
            "outprefix": cli.outprefix,
            "threshold": cli.threshold,
            "roi": roi.map(|roi| roi.to_string()),
            "frames_processed": summary.frames_processed,
            "exported": summary.exported,
            "failed_exports": summary.failed_exports,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if summary.failed_exports > 0 {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("{} slide(s) could not be written", summary.failed_exports).yellow()
        );
    }
    println!("Total frames extracted: {}", summary.exported);

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
