use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use blobtrack_core::calibration::review::{AcceptAll, FrameReview, ReviewDecision};
use blobtrack_core::detection::blob::Blob;
use blobtrack_core::pipeline::csv_writer::CsvRecordWriter;
use blobtrack_core::pipeline::track_blobs_use_case::{RunSummary, TrackBlobsUseCase};
use blobtrack_core::shared::config::RunConfig;
use blobtrack_core::shared::frame::GrayFrame;
use blobtrack_core::video::infrastructure::image_dir_source::ImageDirSource;

/// Blob detection and tracking over directories of video frames.
#[derive(Parser)]
#[command(name = "blobtrack")]
struct Cli {
    /// Directory of image frames; with --batch, a directory of such
    /// directories (one video each).
    input: PathBuf,

    /// Output CSV path (default: <input>.csv). In batch mode, a directory
    /// for the per-video CSV files (default: next to each video).
    output: Option<PathBuf>,

    /// JSON config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum blob area in pixels.
    #[arg(long)]
    min_area: Option<f64>,

    /// Maximum blob area in pixels.
    #[arg(long)]
    max_area: Option<f64>,

    /// Minimum blob circularity (0.0-1.0).
    #[arg(long)]
    min_circularity: Option<f64>,

    /// Maximum blob circularity (0.0-1.0).
    #[arg(long)]
    max_circularity: Option<f64>,

    /// Minimum blob convexity (0.0-1.0).
    #[arg(long)]
    min_convexity: Option<f64>,

    /// Maximum blob convexity (0.0-1.0).
    #[arg(long)]
    max_convexity: Option<f64>,

    /// Minimum inertia ratio (0.0-1.0, low = elongated).
    #[arg(long)]
    min_inertia_ratio: Option<f64>,

    /// Maximum inertia ratio (0.0-1.0).
    #[arg(long)]
    max_inertia_ratio: Option<f64>,

    /// Frames a track survives without a match.
    #[arg(long)]
    max_age: Option<u32>,

    /// Consecutive matches before a track is reported.
    #[arg(long)]
    min_hits: Option<u32>,

    /// Minimum IoU to accept a track-blob match (0.0-1.0).
    #[arg(long)]
    iou_thresh: Option<f64>,

    /// Recording framerate, for the timestamp column only.
    #[arg(long)]
    framerate: Option<f64>,

    /// Frames sampled for the background median.
    #[arg(long)]
    background_samples: Option<usize>,

    /// Frames sampled for threshold calibration.
    #[arg(long)]
    threshold_samples: Option<usize>,

    /// Fixed binarization threshold (1-255); skips calibration.
    #[arg(long)]
    threshold: Option<u8>,

    /// Seed for calibration frame sampling.
    #[arg(long)]
    seed: Option<u64>,

    /// Fill the timestamp column from the framerate.
    #[arg(long)]
    timestamps: bool,

    /// Process every subdirectory of the input as its own video, in
    /// parallel.
    #[arg(long)]
    batch: bool,

    /// Confirm each sampled calibration frame on the terminal.
    #[arg(long)]
    review: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;

    if cli.batch {
        run_batch(&cli.input, cli.output.as_deref(), &config)
    } else {
        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| cli.input.with_extension("csv"));
        let summary = run_video(&cli.input, &output, &config, cli.review, true)?;
        eprintln!();
        log::info!(
            "{}: threshold {}, {} records over {} frames -> {}",
            cli.input.display(),
            summary.threshold,
            summary.records_written,
            summary.frames_processed,
            output.display()
        );
        Ok(())
    }
}

fn run_video(
    input: &Path,
    output: &Path,
    config: &RunConfig,
    review: bool,
    show_progress: bool,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let mut source = ImageDirSource::open(input, config.framerate.unwrap_or(0.0))?;
    let writer = Box::new(CsvRecordWriter::create(output)?);

    let mut accept_all = AcceptAll;
    let mut stdin_review = StdinReview;
    let reviewer: &mut dyn FrameReview = if review {
        &mut stdin_review
    } else {
        &mut accept_all
    };

    let mut progress = |current: usize, total: usize| {
        if show_progress {
            eprint!("\rTracking frame {current}/{total}");
        }
    };

    let use_case = TrackBlobsUseCase::new(config.clone());
    let summary = use_case.execute(&mut source, writer, reviewer, &mut progress)?;
    Ok(summary)
}

fn run_batch(
    root: &Path,
    output_dir: Option<&Path>,
    config: &RunConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut videos: Vec<PathBuf> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    videos.sort();
    if videos.is_empty() {
        return Err(format!("no video directories found in {}", root.display()).into());
    }
    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)?;
    }

    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(videos.len());
    let chunk_size = videos.len().div_ceil(workers);

    // Each video owns an isolated tracker, so videos can run in parallel.
    let failures: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = videos
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    let mut errors = Vec::new();
                    for video in chunk {
                        let output = batch_output_path(video, output_dir);
                        match run_video(video, &output, config, false, false) {
                            Ok(summary) => log::info!(
                                "{}: {} records over {} frames -> {}",
                                video.display(),
                                summary.records_written,
                                summary.frames_processed,
                                output.display()
                            ),
                            Err(e) => errors.push(format!("{}: {e}", video.display())),
                        }
                    }
                    errors
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_default())
            .collect()
    });

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures.join("\n").into())
    }
}

fn batch_output_path(video: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => {
            let name = video.file_name().unwrap_or_default();
            let mut file = name.to_owned();
            file.push(".csv");
            dir.join(file)
        }
        None => video.with_extension("csv"),
    }
}

fn build_config(cli: &Cli) -> Result<RunConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::from_json_file(path)?,
        None => RunConfig::default(),
    };

    let d = &mut config.detector;
    d.min_area = cli.min_area.or(d.min_area);
    d.max_area = cli.max_area.or(d.max_area);
    d.min_circularity = cli.min_circularity.or(d.min_circularity);
    d.max_circularity = cli.max_circularity.or(d.max_circularity);
    d.min_convexity = cli.min_convexity.or(d.min_convexity);
    d.max_convexity = cli.max_convexity.or(d.max_convexity);
    d.min_inertia_ratio = cli.min_inertia_ratio.or(d.min_inertia_ratio);
    d.max_inertia_ratio = cli.max_inertia_ratio.or(d.max_inertia_ratio);

    if let Some(max_age) = cli.max_age {
        config.tracker.max_age = max_age;
    }
    if let Some(min_hits) = cli.min_hits {
        config.tracker.min_hits = min_hits;
    }
    if let Some(iou_thresh) = cli.iou_thresh {
        config.tracker.iou_thresh = iou_thresh;
    }
    if let Some(samples) = cli.background_samples {
        config.background_samples = samples;
    }
    if let Some(samples) = cli.threshold_samples {
        config.threshold_samples = samples;
    }
    config.threshold = cli.threshold.or(config.threshold);
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    config.framerate = cli.framerate.or(config.framerate);
    if !cli.timestamps {
        // Framerate is carried for metadata only; no timestamp column
        // values unless asked for.
        config.framerate = None;
    }

    Ok(config)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.is_dir() {
        return Err(format!("Input directory not found: {}", cli.input.display()).into());
    }
    if cli.batch && cli.review {
        return Err("--review cannot be combined with --batch".into());
    }
    if cli.timestamps && cli.framerate.is_none() && cli.config.is_none() {
        return Err("--timestamps requires --framerate (or a config with one)".into());
    }
    if cli.threshold == Some(0) {
        return Err("Threshold must be between 1 and 255".into());
    }
    if let Some(min_hits) = cli.min_hits {
        if min_hits == 0 {
            return Err("--min-hits must be at least 1".into());
        }
    }
    if let Some(samples) = cli.background_samples {
        if samples == 0 {
            return Err("--background-samples must be at least 1".into());
        }
    }
    for (name, value) in [
        ("--iou-thresh", cli.iou_thresh),
        ("--min-circularity", cli.min_circularity),
        ("--max-circularity", cli.max_circularity),
        ("--min-convexity", cli.min_convexity),
        ("--max-convexity", cli.max_convexity),
        ("--min-inertia-ratio", cli.min_inertia_ratio),
        ("--max-inertia-ratio", cli.max_inertia_ratio),
    ] {
        if let Some(v) = value {
            if !(0.0..=1.0).contains(&v) {
                return Err(format!("{name} must be between 0.0 and 1.0, got {v}").into());
            }
        }
    }
    if let Some(fps) = cli.framerate {
        if fps <= 0.0 {
            return Err(format!("Framerate must be positive, got {fps}").into());
        }
    }
    Ok(())
}

/// Terminal reviewer: one yes/no prompt per sampled calibration frame. A
/// "no" (or closed stdin) cancels the run.
struct StdinReview;

impl FrameReview for StdinReview {
    fn review(&mut self, frame: &GrayFrame, candidates: &[Blob]) -> ReviewDecision {
        eprintln!(
            "Calibration frame {}: {} candidate blobs",
            frame.index(),
            candidates.len()
        );
        loop {
            eprint!("Use this frame? [y/n] ");
            let _ = io::stderr().flush();
            let mut line = String::new();
            match io::stdin().lock().read_line(&mut line) {
                Ok(0) | Err(_) => return ReviewDecision::Reject,
                Ok(_) => match line.trim().to_lowercase().as_str() {
                    "y" | "yes" => return ReviewDecision::Accept,
                    "n" | "no" => return ReviewDecision::Reject,
                    _ => continue,
                },
            }
        }
    }
}
