//! Parallel batch runner.
//!
//! Each image is an independent job: decode, locate, frame, save. Workers share only
//! read-only state plus the [`BatchProgress`] counters owned by the caller.

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use anyhow::{Context, Result};
use eyeline_core::{CropPlan, CropRectangle, FaceFramer, FaceLocator, FrameError, SourceFrame};
use eyeline_utils::{OutputOptions, Stage, load_image, save_dynamic_image, time_stage};
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::input::{ProcessingItem, output_path_for};

/// Reason recorded when an existing output is kept.
pub const OUTPUT_EXISTS: &str = "output_exists";

/// Everything a worker needs besides the framer.
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Destination directory; `None` only for dry runs.
    pub output_dir: Option<PathBuf>,
    pub options: OutputOptions,
    pub prefix: String,
    pub overwrite: bool,
    pub dry_run: bool,
    /// Worker threads, 0 for one per logical core.
    pub jobs: usize,
}

impl BatchJob {
    fn destination(&self, item: &ProcessingItem) -> Option<PathBuf> {
        self.output_dir
            .as_deref()
            .map(|dir| output_path_for(item, dir, &self.prefix, self.options.format))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Processed,
    Skipped,
    Failed,
}

/// Crop rectangle as written to reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRecord {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

impl From<CropRectangle> for CropRecord {
    fn from(rect: CropRectangle) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            size: rect.size,
        }
    }
}

/// Result of one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOutcome {
    pub image: PathBuf,
    pub status: ItemStatus,
    /// Machine-readable cause for skips and failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropRecord>,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl ItemOutcome {
    fn processed(image: &Path, plan: &CropPlan, output: Option<PathBuf>) -> Self {
        Self {
            image: image.to_path_buf(),
            status: ItemStatus::Processed,
            reason: None,
            message: None,
            crop: Some(plan.rect.into()),
            fallback: plan.fallback,
            output,
        }
    }

    fn unprocessed(image: &Path, status: ItemStatus, reason: &str, message: String) -> Self {
        Self {
            image: image.to_path_buf(),
            status,
            reason: Some(reason.to_string()),
            message: Some(message),
            crop: None,
            fallback: false,
            output: None,
        }
    }

    /// Classify an error: detection problems are skips, everything else a failure.
    fn from_error(image: &Path, err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");
        match err.downcast_ref::<FrameError>() {
            Some(frame_err) if frame_err.is_skip() => {
                Self::unprocessed(image, ItemStatus::Skipped, frame_err.kind(), message)
            }
            Some(frame_err) => {
                Self::unprocessed(image, ItemStatus::Failed, frame_err.kind(), message)
            }
            None => Self::unprocessed(image, ItemStatus::Failed, "io_error", message),
        }
    }
}

/// Running totals shared by the workers of one batch.
#[derive(Debug, Default)]
pub struct BatchProgress {
    total: usize,
    completed: AtomicUsize,
    processed: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

/// Snapshot of [`BatchProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Count an outcome and return how many items have completed so far.
    pub fn record(&self, outcome: &ItemOutcome) -> usize {
        let counter = match outcome.status {
            ItemStatus::Processed => &self.processed,
            ItemStatus::Skipped => &self.skipped,
            ItemStatus::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            total: self.total,
            processed: self.processed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Process every item on a rayon pool. Outcomes are returned in input order.
pub fn run_batch<L: FaceLocator>(
    items: &[ProcessingItem],
    framer: &FaceFramer<L>,
    job: &BatchJob,
    progress: &BatchProgress,
) -> Result<Vec<ItemOutcome>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(job.jobs)
        .build()
        .context("failed to build worker pool")?;
    info!(
        "Processing {} image(s) on {} worker(s)",
        items.len(),
        pool.current_num_threads()
    );

    let _timer = time_stage(Stage::Batch).with_detail(format!("of {} image(s)", items.len()));
    let outcomes: Vec<ItemOutcome> = pool.install(|| {
        items
            .par_iter()
            .map(|item| {
                let outcome = process_item(item, framer, job);
                let done = progress.record(&outcome);
                log_outcome(done, progress.total(), &outcome);
                outcome
            })
            .collect()
    });
    Ok(outcomes)
}

/// Run one image through the pipeline; never fails, errors become outcomes.
pub fn process_item<L: FaceLocator>(
    item: &ProcessingItem,
    framer: &FaceFramer<L>,
    job: &BatchJob,
) -> ItemOutcome {
    let destination = job.destination(item);
    if !job.dry_run
        && !job.overwrite
        && let Some(existing) = destination.as_ref().filter(|path| path.exists())
    {
        return ItemOutcome::unprocessed(
            &item.source,
            ItemStatus::Skipped,
            OUTPUT_EXISTS,
            format!("{} already exists", existing.display()),
        );
    }

    let _timer = time_stage(Stage::Item).with_detail(item.relative.display());
    match frame_item(item, framer, job, destination.as_deref()) {
        Ok(plan) => {
            let output = if job.dry_run { None } else { destination };
            ItemOutcome::processed(&item.source, &plan, output)
        }
        Err(err) => ItemOutcome::from_error(&item.source, &err),
    }
}

fn frame_item<L: FaceLocator>(
    item: &ProcessingItem,
    framer: &FaceFramer<L>,
    job: &BatchJob,
    destination: Option<&Path>,
) -> Result<CropPlan> {
    let image = load_image(&item.source).map_err(classify_load_error)?;
    let frame = SourceFrame::with_path(&image, &item.source);
    if job.dry_run {
        return Ok(framer.plan(&frame)?);
    }

    let framed = framer.frame(&frame)?;
    let destination = destination.context("no output directory configured")?;
    save_dynamic_image(&framed.image, destination, &job.options)?;
    Ok(framed.plan)
}

/// Open and read failures stay I/O errors; anything the decoder rejects is unsupported.
fn classify_load_error(err: anyhow::Error) -> anyhow::Error {
    if err.chain().any(|cause| cause.is::<std::io::Error>()) {
        err
    } else {
        FrameError::UnsupportedImage(format!("{err:#}")).into()
    }
}

fn log_outcome(done: usize, total: usize, outcome: &ItemOutcome) {
    let image = outcome.image.display();
    match outcome.status {
        ItemStatus::Processed => {
            let crop = outcome
                .crop
                .map(|c| format!("{}px at ({}, {})", c.size, c.x, c.y))
                .unwrap_or_default();
            let mode = if outcome.fallback { " [fallback]" } else { "" };
            match outcome.output.as_ref() {
                Some(output) => info!(
                    "[{done}/{total}] {image}: crop {crop}{mode} -> {}",
                    output.display()
                ),
                None => info!("[{done}/{total}] {image}: crop {crop}{mode}"),
            }
        }
        ItemStatus::Skipped => info!(
            "[{done}/{total}] skipped {image}: {}",
            outcome.message.as_deref().unwrap_or("no reason")
        ),
        ItemStatus::Failed => warn!(
            "[{done}/{total}] failed {image}: {}",
            outcome.message.as_deref().unwrap_or("unknown error")
        ),
    }
}
