//! Command-line argument definitions for the `eyeline` binary.

use clap::{ArgAction, Parser};
use eyeline_utils::config::Interpolation;
use std::path::PathBuf;

/// Normalize single-face photos into square, eye-line-anchored training crops.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct CropArgs {
    /// Path to an image file or a directory containing images.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory receiving the processed crops (created if missing).
    #[arg(short, long, required_unless_present = "dry_run")]
    pub output_dir: Option<PathBuf>,

    /// JSON manifest with face detections for the input images. Without it, a
    /// `<stem>.faces.json` sidecar next to each image is used.
    #[arg(short, long)]
    pub detections: Option<PathBuf>,

    /// Optional settings JSON. Defaults to `config/eyeline.json` when present, otherwise built-in parameters.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output size preset (Thumbnail, SD 1.5, SD 2, SDXL, Flux).
    #[arg(long)]
    pub preset: Option<String>,

    /// Side length of the square output in pixels. Overrides --preset.
    #[arg(long)]
    pub target_size: Option<u32>,

    /// Eye-line position as a fraction of the crop height from the top.
    #[arg(long)]
    pub vertical_fraction: Option<f32>,

    /// Minimum crop side as a multiple of the face width.
    #[arg(long)]
    pub margin_factor: Option<f32>,

    /// Eye-line estimate as a fraction of the face box height, used when eyes are missing.
    #[arg(long)]
    pub eye_line_fallback: Option<f32>,

    /// Resampling filter: auto, nearest, bilinear, bicubic, lanczos.
    #[arg(long, value_name = "MODE")]
    pub interpolation: Option<Interpolation>,

    /// Output image format: png, jpeg, webp, bmp, tiff. Defaults to the input format.
    #[arg(long)]
    pub output_format: Option<String>,

    /// JPEG quality when saving as JPEG (1-100).
    #[arg(long)]
    pub jpeg_quality: Option<u8>,

    /// PNG compression strategy: fast, default, best, or numeric level 0-9.
    #[arg(long)]
    pub png_compression: Option<String>,

    /// Prefix prepended to output file names.
    #[arg(long)]
    pub prefix: Option<String>,

    /// Keep existing output files instead of replacing them.
    #[arg(long = "no-overwrite", action = ArgAction::SetTrue)]
    pub no_overwrite: bool,

    /// Worker threads (0 = one per logical core).
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Descend into sub-directories of the input directory.
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub recursive: bool,

    /// Compute and report crops without writing images.
    #[arg(long, action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Write a JSON report with one entry per input image.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Enable telemetry timing logs (defaults to settings file).
    #[arg(long, action = ArgAction::SetTrue)]
    pub telemetry: bool,

    /// Override telemetry logging level (error, warn, info, debug, trace).
    #[arg(long, value_name = "LEVEL")]
    pub telemetry_level: Option<String>,
}
