//! Configuration loading and CLI override logic.

use std::path::PathBuf;

use anyhow::{Context, Result};
use eyeline_core::{CropSettings, preset_by_name, standard_presets};
use eyeline_utils::{
    config::{AppSettings, CropConfig, default_settings_path},
    normalize_path,
};
use log::{info, warn};

use crate::args::CropArgs;

/// Load application settings from a file or use defaults.
pub fn load_settings(config_path: Option<&PathBuf>) -> Result<AppSettings> {
    if let Some(path) = config_path {
        let resolved = normalize_path(path)?;
        let settings = AppSettings::load_from_path(&resolved)?;
        info!("Loaded settings from {}", resolved.display());
        Ok(settings)
    } else {
        let default_path = default_settings_path();
        if default_path.exists() {
            let settings = AppSettings::load_from_path(&default_path).with_context(|| {
                format!(
                    "failed to load default settings from {}",
                    default_path.display()
                )
            })?;
            info!("Loaded settings from {}", default_path.display());
            Ok(settings)
        } else {
            Ok(AppSettings::default())
        }
    }
}

/// Apply command-line arguments to override loaded or default settings.
pub fn apply_cli_overrides(settings: &mut AppSettings, args: &CropArgs) {
    if args.telemetry {
        settings.telemetry.enabled = true;
    }
    if let Some(level) = args.telemetry_level.as_ref() {
        let normalized = level.trim();
        if !normalized.is_empty() {
            let lower = normalized.to_ascii_lowercase();
            settings.telemetry.level = lower.clone();
            if lower == "off" {
                settings.telemetry.enabled = false;
            }
        }
    }

    if let Some(name) = args.preset.as_deref() {
        match preset_by_name(name) {
            Some(preset) => {
                info!("Using preset {}: {}", preset.name, preset.description);
                settings.crop.target_size = preset.size;
            }
            None => warn!(
                "unknown --preset '{name}', keeping {}px; available presets:\n{}",
                settings.crop.target_size,
                preset_listing()
            ),
        }
    }
    if let Some(size) = args.target_size {
        settings.crop.target_size = size;
    }
    if let Some(fraction) = args.vertical_fraction {
        settings.crop.vertical_fraction = fraction;
    }
    if let Some(factor) = args.margin_factor {
        settings.crop.margin_factor = factor;
    }
    if let Some(fallback) = args.eye_line_fallback {
        settings.crop.eye_line_fallback = fallback;
    }
    if let Some(interpolation) = args.interpolation {
        settings.crop.interpolation = interpolation;
    }

    if let Some(format) = args.output_format.as_ref() {
        settings.output.format = format.trim().to_ascii_lowercase();
    }
    if let Some(quality) = args.jpeg_quality {
        settings.output.jpeg_quality = quality;
    }
    if let Some(compression) = args.png_compression.as_ref() {
        settings.output.png_compression = compression.clone();
    }
    if let Some(prefix) = args.prefix.as_ref() {
        settings.output.filename_prefix = prefix.clone();
    }
    if args.no_overwrite {
        settings.output.overwrite = false;
    }

    if let Some(jobs) = args.jobs {
        settings.batch.jobs = jobs;
    }
    if args.recursive {
        settings.batch.recursive = true;
    }
}

/// One line per built-in preset: name, size and description.
fn preset_listing() -> String {
    standard_presets()
        .iter()
        .map(|preset| {
            format!(
                "  {:<10} {:>5}px  {}",
                preset.name, preset.size, preset.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert the crop section into validated core settings.
pub fn build_core_crop_settings(cfg: &CropConfig) -> Result<CropSettings> {
    let settings = CropSettings::from(cfg);
    settings
        .validate()
        .context("crop settings rejected")?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use eyeline_utils::config::Interpolation;

    fn parse(extra: &[&str]) -> CropArgs {
        let mut argv = vec!["eyeline", "-i", "in", "-o", "out"];
        argv.extend_from_slice(extra);
        CropArgs::try_parse_from(argv).expect("parse args")
    }

    #[test]
    fn explicit_size_wins_over_preset() {
        let mut settings = AppSettings::default();
        apply_cli_overrides(&mut settings, &parse(&["--preset", "sdxl"]));
        assert_eq!(settings.crop.target_size, 1024);

        let mut settings = AppSettings::default();
        apply_cli_overrides(
            &mut settings,
            &parse(&["--preset", "sdxl", "--target-size", "640"]),
        );
        assert_eq!(settings.crop.target_size, 640);
    }

    #[test]
    fn unknown_preset_keeps_configured_size() {
        let mut settings = AppSettings::default();
        apply_cli_overrides(&mut settings, &parse(&["--preset", "passport"]));
        assert_eq!(settings.crop.target_size, 512);
    }

    #[test]
    fn preset_listing_describes_every_preset() {
        let listing = preset_listing();
        assert_eq!(listing.lines().count(), standard_presets().len());
        assert!(listing.contains("SDXL"));
        assert!(listing.contains("SDXL training size (1024×1024)"));
    }

    #[test]
    fn absent_flags_keep_loaded_values() {
        let mut settings = AppSettings::default();
        settings.crop.margin_factor = 3.0;
        settings.output.filename_prefix = "crop_".into();
        settings.batch.recursive = true;
        apply_cli_overrides(&mut settings, &parse(&[]));
        assert_eq!(settings.crop.margin_factor, 3.0);
        assert_eq!(settings.output.filename_prefix, "crop_");
        assert!(settings.batch.recursive);
        assert!(settings.output.overwrite);
    }

    #[test]
    fn overrides_flow_into_settings() {
        let mut settings = AppSettings::default();
        apply_cli_overrides(
            &mut settings,
            &parse(&[
                "--interpolation",
                "bicubic",
                "--output-format",
                "JPEG",
                "--prefix",
                "",
                "--telemetry-level",
                "off",
                "--no-overwrite",
            ]),
        );
        assert_eq!(settings.crop.interpolation, Interpolation::Bicubic);
        assert_eq!(settings.output.format, "jpeg");
        assert_eq!(settings.output.filename_prefix, "");
        assert!(!settings.output.overwrite);
        assert!(!settings.telemetry.enabled);
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        let cfg = CropConfig {
            vertical_fraction: 0.0,
            ..CropConfig::default()
        };
        assert!(build_core_crop_settings(&cfg).is_err());
        assert!(build_core_crop_settings(&CropConfig::default()).is_ok());
    }
}
