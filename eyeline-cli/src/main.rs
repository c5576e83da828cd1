mod args;
mod batch;
mod config;
mod detections;
mod input;
mod report;

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use eyeline_core::{FaceFramer, FaceLocator};
use eyeline_utils::{OutputOptions, configure_telemetry, init_logging, normalize_path};
use log::{info, warn};

use crate::{
    args::CropArgs,
    batch::{BatchJob, BatchProgress, run_batch},
    config::{apply_cli_overrides, build_core_crop_settings, load_settings},
    detections::{ManifestLocator, SidecarLocator},
    input::collect_targets,
    report::{BatchReport, write_report},
};

fn main() -> Result<()> {
    init_logging(log::LevelFilter::Info)?;
    let args = CropArgs::parse();

    let mut settings = load_settings(args.config.as_ref())?;
    apply_cli_overrides(&mut settings, &args);
    configure_telemetry(
        settings.telemetry.enabled,
        settings.telemetry.level_filter(),
    );
    let crop_settings = build_core_crop_settings(&settings.crop)?;

    let input_path = normalize_path(&args.input)?;
    let items = collect_targets(&input_path, settings.batch.recursive)?;
    info!("Found {} image(s) in {}", items.len(), input_path.display());

    let output_dir = match args.output_dir.as_ref() {
        Some(dir) if !args.dry_run => {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create output directory {}", dir.display()))?;
            info!("Writing crops to {}", dir.display());
            Some(dir.clone())
        }
        Some(dir) => Some(dir.clone()),
        None => None,
    };

    let locator: Box<dyn FaceLocator> = match args.detections.as_ref() {
        Some(manifest) => Box::new(ManifestLocator::load(&normalize_path(manifest)?)?),
        None => {
            info!("No --detections manifest; reading <stem>.faces.json sidecars");
            Box::new(SidecarLocator)
        }
    };
    let framer = FaceFramer::new(locator, crop_settings)?;

    let job = BatchJob {
        output_dir,
        options: OutputOptions::from_output_config(&settings.output),
        prefix: settings.output.filename_prefix.clone(),
        overwrite: settings.output.overwrite,
        dry_run: args.dry_run,
        jobs: settings.batch.jobs,
    };
    let progress = BatchProgress::new(items.len());
    let outcomes = run_batch(&items, &framer, &job, &progress)?;
    let summary = progress.summary();

    if let Some(report_path) = args.report.as_ref() {
        let report = BatchReport {
            version: eyeline_core::version(),
            dry_run: args.dry_run,
            target_size: framer.settings().target_size,
            summary,
            items: &outcomes,
        };
        write_report(report_path, &report)?;
        info!("Wrote report to {}", report_path.display());
    }

    info!(
        "Done: {} processed, {} skipped, {} failed (of {})",
        summary.processed, summary.skipped, summary.failed, summary.total
    );
    if summary.failed > 0 {
        warn!("{} image(s) failed; see messages above", summary.failed);
    }
    anyhow::ensure!(
        summary.processed > 0,
        "no images were processed ({} skipped, {} failed)",
        summary.skipped,
        summary.failed
    );
    Ok(())
}
