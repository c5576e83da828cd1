//! Common helpers shared across the eyeline crates.

/// Application configuration and settings management.
pub mod config;
/// Test fixture loading and path resolution.
pub mod fixtures;
/// Image loading and format discovery.
pub mod image_utils;
/// Image output helpers (format selection, encoding).
pub mod output;
/// Optional stage timings.
pub mod telemetry;

use std::path::Path;

use anyhow::Result;
use log::LevelFilter;

pub use config::{AppSettings, Interpolation};
pub use fixtures::{fixtures_dir, load_fixture_json};
pub use image_utils::{SUPPORTED_EXTENSIONS, is_supported_image, load_image};
pub use output::{ImageFormatHint, OutputOptions, PngCompression, save_dynamic_image};
pub use telemetry::{Stage, StageTimer, configure as configure_telemetry, time_stage};

/// Initialize logging once for the CLI and test harnesses.
///
/// This function respects the `RUST_LOG` environment variable if it is set.
/// Otherwise, it falls back to the provided default filter level.
///
/// # Arguments
///
/// * `default_filter` - The `LevelFilter` to use if `RUST_LOG` is not set.
pub fn init_logging(default_filter: LevelFilter) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    );
    builder.filter_module(telemetry::TELEMETRY_TARGET, LevelFilter::Trace);

    if builder.try_init().is_err() {
        // Logger already initialized; nothing to do.
    }
    Ok(())
}

/// Validate that a path exists and resolve it to an absolute path.
///
/// # Arguments
///
/// * `path` - The path to validate and normalize.
pub fn normalize_path<P: AsRef<Path>>(path: P) -> Result<std::path::PathBuf> {
    let path = path.as_ref();
    anyhow::ensure!(path.exists(), "path does not exist: {}", path.display());
    Ok(path.canonicalize()?)
}
