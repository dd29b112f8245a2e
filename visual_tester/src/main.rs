use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use shoe_vision::OverlayConfig;
use shoe_vision::core_modules::detection::{FrameManifest, ObjectDetector, ReplayDetector};
use shoe_vision::parallel_pipeline::ParallelPipeline;
use shoe_vision::pipeline::Report;
use std::fs;
use std::path::{Path, PathBuf};

/// Replays recorded detections over their frames and writes annotated PNGs.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON manifest listing frame images and their detections.
    manifest: PathBuf,
    /// Directory the annotated frames are written to.
    output_dir: PathBuf,
    /// Optional JSON overlay configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of render workers. Defaults to one per CPU.
    #[arg(long)]
    workers: Option<usize>,
}

/// Output name for the frame at `index` in the manifest. The index prefix keeps
/// names unique when two frames share a file stem.
fn output_file_name(index: usize, image: &Path) -> PathBuf {
    match image.file_stem() {
        Some(stem) => PathBuf::from(format!("{index:05}_{}.png", stem.to_string_lossy())),
        None => PathBuf::from(format!("{index:05}.png")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // --- 1. Setup ---
    let config = match &args.config {
        Some(path) => OverlayConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => OverlayConfig::default(),
    };
    let manifest = FrameManifest::load(&args.manifest)
        .with_context(|| format!("loading manifest {}", args.manifest.display()))?;
    let base_dir = args
        .manifest
        .parent()
        .map(PathBuf::from)
        .unwrap_or_default();
    fs::create_dir_all(&args.output_dir)?;

    let mut detector = ReplayDetector::from_manifest(&manifest);
    detector.set_options(&config.detector)?;

    let pipeline = match args.workers {
        Some(workers) => ParallelPipeline::with_workers(config, workers)?,
        None => ParallelPipeline::new(config)?,
    };
    let batch_size = pipeline.worker_count() * 2;

    // --- 2. Main Processing Loop ---
    let mut totals = (0usize, 0usize, 0usize);
    for (chunk_index, chunk) in manifest.frames.chunks(batch_size).enumerate() {
        let mut batch = Vec::with_capacity(chunk.len());
        for entry in chunk {
            let path = base_dir.join(&entry.image);
            let frame = image::open(&path)
                .with_context(|| format!("reading frame {}", path.display()))?
                .to_rgba8();
            let detections = detector.detect(&frame)?;
            batch.push((frame, detections));
        }

        let rendered = pipeline.process_batch(batch).await?;

        // --- 3. Write Output Frames ---
        for (offset, (entry, frame)) in chunk.iter().zip(rendered).enumerate() {
            let index = chunk_index * batch_size + offset;
            let output_path = args.output_dir.join(output_file_name(index, &entry.image));
            frame
                .canvas
                .save(&output_path)
                .with_context(|| format!("writing {}", output_path.display()))?;

            if let Report::Rendered(summary) = frame.report {
                totals.0 += summary.boxes_drawn;
                totals.1 += summary.axes_skipped;
                totals.2 += summary.rejected_detections;
            }
        }
    }
    pipeline.shutdown().await;

    if totals.2 > 0 {
        warn!("{} detections were rejected as malformed", totals.2);
    }
    info!(
        "Processing complete: {} frames, {} boxes, {} skipped axes. Output saved to {}",
        manifest.frames.len(),
        totals.0,
        totals.1,
        args.output_dir.display()
    );
    Ok(())
}
