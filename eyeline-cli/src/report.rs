//! JSON batch report.

use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::batch::{BatchSummary, ItemOutcome};

#[derive(Debug, Serialize)]
pub struct BatchReport<'a> {
    pub version: &'static str,
    pub dry_run: bool,
    pub target_size: u32,
    pub summary: BatchSummary,
    pub items: &'a [ItemOutcome],
}

/// Write `report` as pretty JSON, creating parent directories.
pub fn write_report(path: &Path, report: &BatchReport<'_>) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{CropRecord, ItemStatus};
    use serde_json::Value;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn report_lists_every_item() {
        let dir = tempdir().expect("tempdir");
        let items = vec![
            ItemOutcome {
                image: PathBuf::from("in/a.png"),
                status: ItemStatus::Processed,
                reason: None,
                message: None,
                crop: Some(CropRecord {
                    x: 28,
                    y: 55,
                    size: 945,
                }),
                fallback: false,
                output: Some(PathBuf::from("out/processed_a.png")),
            },
            ItemOutcome {
                image: PathBuf::from("in/b.png"),
                status: ItemStatus::Skipped,
                reason: Some("ambiguous_face".into()),
                message: Some("expected exactly one face, found 2".into()),
                crop: None,
                fallback: false,
                output: None,
            },
        ];
        let report = BatchReport {
            version: "test",
            dry_run: false,
            target_size: 512,
            summary: BatchSummary {
                total: 2,
                processed: 1,
                skipped: 1,
                failed: 0,
            },
            items: &items,
        };
        let path = dir.path().join("reports/run.json");
        write_report(&path, &report).expect("write report");

        let value: Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(value["summary"]["processed"], 1);
        assert_eq!(value["items"][0]["crop"]["size"], 945);
        assert_eq!(value["items"][1]["status"], "skipped");
        assert_eq!(value["items"][1]["reason"], "ambiguous_face");
        assert!(value["items"][1].get("crop").is_none());
    }
}
