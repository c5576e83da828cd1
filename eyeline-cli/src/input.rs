//! Input discovery and output naming.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use eyeline_utils::{ImageFormatHint, SUPPORTED_EXTENSIONS, is_supported_image};
use log::{debug, warn};
use walkdir::WalkDir;

/// One image scheduled for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingItem {
    pub source: PathBuf,
    /// Path of the source relative to the input root; just the file name for single files.
    pub relative: PathBuf,
}

/// Collect all supported image paths from a file or directory, sorted.
pub fn collect_images(path: &Path, recursive: bool) -> Result<Vec<ProcessingItem>> {
    if path.is_file() {
        let relative = path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| path.to_path_buf());
        return Ok(vec![ProcessingItem {
            source: path.to_path_buf(),
            relative,
        }]);
    }

    if !path.is_dir() {
        anyhow::bail!(
            "input path is neither file nor directory: {}",
            path.display()
        );
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut items = Vec::new();
    for entry in WalkDir::new(path).follow_links(false).max_depth(max_depth) {
        let entry = match entry {
            Ok(entry) => entry,
            // The input directory itself must be readable.
            Err(err) if err.depth() == 0 || err.path() == Some(path) => {
                return Err(err)
                    .with_context(|| format!("cannot read input directory {}", path.display()));
            }
            Err(err) => {
                warn!("Skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if is_supported_image(entry.path()) {
            let relative = entry
                .path()
                .strip_prefix(path)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| PathBuf::from(entry.file_name()));
            items.push(ProcessingItem {
                source: entry.path().to_path_buf(),
                relative,
            });
        } else {
            debug!("Skipping non-image file {}", entry.path().display());
        }
    }
    items.sort_by(|a, b| a.source.cmp(&b.source));
    Ok(items)
}

/// Collect images and fail when there is nothing to process.
pub fn collect_targets(path: &Path, recursive: bool) -> Result<Vec<ProcessingItem>> {
    let items = collect_images(path, recursive)?;
    if items.is_empty() {
        anyhow::bail!(
            "no images found at {} (supported extensions: {})",
            path.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        );
    }
    Ok(items)
}

/// Destination for a processed item: `<output_dir>/<sub dirs>/<prefix><file name>`.
///
/// A forced `format` replaces the extension; otherwise the input name is kept.
pub fn output_path_for(
    item: &ProcessingItem,
    output_dir: &Path,
    prefix: &str,
    format: Option<ImageFormatHint>,
) -> PathBuf {
    let stem = item
        .relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let file_name = match (format, item.relative.extension()) {
        (Some(format), _) => format!("{prefix}{stem}.{}", format.extension()),
        (None, Some(ext)) => format!("{prefix}{stem}.{}", ext.to_string_lossy()),
        (None, None) => format!("{prefix}{stem}.png"),
    };
    let mut destination = output_dir.to_path_buf();
    if let Some(parent) = item.relative.parent() {
        destination.push(parent);
    }
    destination.push(file_name);
    destination
}
