//! Shared configuration types consumed across the eyeline workspace.
//!
//! These structures describe crop geometry, output encoding, batch execution and telemetry
//! preferences. They serialize to JSON so a tuned setup can be saved and reused between runs.

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Interpolation used when scaling the crop to the output resolution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Pick a filter from the scale direction (smooth downscale, sharp upscale).
    #[default]
    Auto,
    /// Nearest-neighbour sampling, fastest and blockiest.
    Nearest,
    /// Linear (triangle) filter.
    Bilinear,
    /// Catmull-Rom cubic filter.
    Bicubic,
    /// Lanczos windowed sinc with radius 3.
    Lanczos,
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Interpolation::Auto => "auto",
                Interpolation::Nearest => "nearest",
                Interpolation::Bilinear => "bilinear",
                Interpolation::Bicubic => "bicubic",
                Interpolation::Lanczos => "lanczos",
            }
        )
    }
}

impl FromStr for Interpolation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Interpolation::Auto),
            "nearest" => Ok(Interpolation::Nearest),
            "bilinear" | "linear" | "triangle" => Ok(Interpolation::Bilinear),
            "bicubic" | "cubic" | "catmull-rom" => Ok(Interpolation::Bicubic),
            "lanczos" | "lanczos3" => Ok(Interpolation::Lanczos),
            other => Err(format!(
                "invalid interpolation '{other}'; expected auto, nearest, bilinear, bicubic or lanczos"
            )),
        }
    }
}

/// Crop geometry parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CropConfig {
    /// Side length of the square output image in pixels.
    pub target_size: u32,
    /// Fraction of the crop height, measured from the top, where the eye line lands.
    pub vertical_fraction: f32,
    /// Minimum-viable crop side as a multiple of the face width.
    pub margin_factor: f32,
    /// Eye-line estimate as a fraction of the face box height when eyes are missing.
    pub eye_line_fallback: f32,
    /// Resampling filter.
    pub interpolation: Interpolation,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            target_size: 512,
            vertical_fraction: 1.0 / 3.0,
            margin_factor: 2.2,
            eye_line_fallback: 0.35,
            interpolation: Interpolation::Auto,
        }
    }
}

/// How processed images are written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "png", "jpeg", "webp", or empty to keep the input format.
    pub format: String,
    /// JPEG quality (1-100, only used for JPEG output).
    pub jpeg_quality: u8,
    /// PNG compression strategy ("fast", "default", "best") or numeric level (0-9).
    pub png_compression: String,
    /// Prefix prepended to the input file name.
    pub filename_prefix: String,
    /// Replace existing output files instead of skipping them.
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: String::new(),
            jpeg_quality: 95,
            png_compression: "default".to_string(),
            filename_prefix: "processed_".to_string(),
            overwrite: true,
        }
    }
}

/// Batch execution options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads; 0 uses the rayon default (one per logical core).
    pub jobs: usize,
    /// Descend into sub-directories of the input folder.
    pub recursive: bool,
}

/// Settings controlling optional runtime telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Whether telemetry timing logs are enabled.
    pub enabled: bool,
    /// Logging level for telemetry output (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "debug".to_string(),
        }
    }
}

impl TelemetrySettings {
    /// Resolve the configured level string into a `LevelFilter`.
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" | "warning" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Debug,
        }
    }

    /// Update the level string from a `LevelFilter` value.
    pub fn set_level(&mut self, level: LevelFilter) {
        self.level = level.as_str().to_ascii_lowercase();
    }
}

/// Persistent application settings consumed by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppSettings {
    /// Crop geometry.
    pub crop: CropConfig,
    /// Output encoding and naming.
    pub output: OutputConfig,
    /// Batch execution.
    pub batch: BatchConfig,
    /// Telemetry and diagnostics preferences.
    pub telemetry: TelemetrySettings,
}

impl AppSettings {
    /// Load settings from a JSON file.
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let settings: AppSettings = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse settings JSON at {}", path.display()))?;
        Ok(settings)
    }

    /// Serialize settings to disk in pretty-printed JSON.
    ///
    /// This will overwrite the file if it already exists.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let payload =
            serde_json::to_string_pretty(self).context("failed to serialize settings JSON")?;
        fs::write(path, payload)
            .with_context(|| format!("failed to write settings file {}", path.display()))?;
        Ok(())
    }
}

/// Returns the default path for persisted settings (`config/eyeline.json`).
pub fn default_settings_path() -> PathBuf {
    env::current_dir()
        .map(|dir| dir.join("config/eyeline.json"))
        .unwrap_or_else(|_| PathBuf::from("config/eyeline.json"))
}
