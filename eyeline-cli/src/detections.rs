//! Face detections read from JSON, normalized into [`FaceDetection`] records.
//!
//! Two sources are supported: a single manifest covering the whole batch, or a
//! `<stem>.faces.json` sidecar next to each image.

use std::{
    collections::HashMap,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use eyeline_core::{BoundingBox, FaceDetection, FaceLocator, FrameError, Landmark, SourceFrame};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Suffix replacing the image extension for sidecar detection files.
pub const SIDECAR_SUFFIX: &str = "faces.json";

/// One face as written by a detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionRecord {
    /// `[x, y, width, height]` in image pixels.
    pub bbox: [f32; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_eye: Option<[f32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_eye: Option<[f32; 2]>,
    /// Five points in detector order: right eye, left eye, nose, right mouth, left mouth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<[[f32; 2]; 5]>,
}

impl DetectionRecord {
    /// Normalize into the core record. Explicit eye points win over landmarks.
    pub fn to_detection(&self) -> FaceDetection {
        let [x, y, width, height] = self.bbox;
        let bbox = BoundingBox {
            x,
            y,
            width,
            height,
        };
        let score = self.score.unwrap_or(1.0);
        match (self.left_eye, self.right_eye, self.landmarks) {
            (Some([lx, ly]), Some([rx, ry]), _) => FaceDetection::new(bbox)
                .with_eyes(Landmark::new(lx, ly), Landmark::new(rx, ry))
                .with_score(score),
            (_, _, Some(points)) => {
                let landmarks = points.map(|[px, py]| Landmark::new(px, py));
                FaceDetection::from_landmarks(bbox, &landmarks, score)
            }
            _ => FaceDetection::new(bbox).with_score(score),
        }
    }
}

/// All faces reported for one image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageDetections {
    pub image: String,
    #[serde(default)]
    pub detections: Vec<DetectionRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SidecarContents {
    Records(Vec<DetectionRecord>),
    Entry(ImageDetections),
}

impl SidecarContents {
    fn into_records(self) -> Vec<DetectionRecord> {
        match self {
            SidecarContents::Records(records) => records,
            SidecarContents::Entry(entry) => entry.detections,
        }
    }
}

fn normalize(records: &[DetectionRecord]) -> Vec<FaceDetection> {
    records.iter().map(DetectionRecord::to_detection).collect()
}

fn canonical_or_clone(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Detections for a whole batch loaded from one manifest file.
///
/// Entries are matched by full path first (relative paths resolve against the
/// manifest's directory), then by file name when that name is unique.
#[derive(Debug, Default)]
pub struct ManifestLocator {
    by_path: HashMap<PathBuf, Vec<FaceDetection>>,
    by_name: HashMap<OsString, Option<Vec<FaceDetection>>>,
}

impl ManifestLocator {
    /// Load a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read detection manifest {}", path.display()))?;
        let entries: Vec<ImageDetections> = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse detection manifest {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let locator = Self::from_entries(entries, base);
        info!(
            "Loaded detections for {} image(s) from {}",
            locator.len(),
            path.display()
        );
        Ok(locator)
    }

    /// Build a locator from parsed entries; relative image paths resolve against `base`.
    pub fn from_entries(entries: Vec<ImageDetections>, base: &Path) -> Self {
        let mut locator = Self::default();
        for entry in entries {
            let image = Path::new(&entry.image);
            let faces = normalize(&entry.detections);
            if let Some(name) = image.file_name() {
                locator
                    .by_name
                    .entry(name.to_os_string())
                    .and_modify(|slot| *slot = None)
                    .or_insert_with(|| Some(faces.clone()));
            }
            let resolved = if image.is_absolute() {
                image.to_path_buf()
            } else {
                base.join(image)
            };
            if locator
                .by_path
                .insert(canonical_or_clone(&resolved), faces)
                .is_some()
            {
                warn!("duplicate manifest entry for {}", entry.image);
            }
        }
        locator
    }

    /// Number of images with an entry.
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    fn lookup(&self, path: &Path) -> Option<&Vec<FaceDetection>> {
        if let Some(faces) = self.by_path.get(&canonical_or_clone(path)) {
            return Some(faces);
        }
        path.file_name()
            .and_then(|name| self.by_name.get(name))
            .and_then(Option::as_ref)
    }
}

impl FaceLocator for ManifestLocator {
    fn locate(&self, frame: &SourceFrame<'_>) -> Result<Vec<FaceDetection>, FrameError> {
        let path = frame
            .path
            .ok_or_else(|| FrameError::Locator("manifest lookup needs an image path".into()))?;
        self.lookup(path).cloned().ok_or_else(|| {
            FrameError::Locator(format!("no manifest entry for {}", path.display()))
        })
    }
}

/// Reads `<stem>.faces.json` next to each image.
#[derive(Debug, Default, Clone, Copy)]
pub struct SidecarLocator;

impl SidecarLocator {
    /// Sidecar path for `image`.
    pub fn sidecar_path(image: &Path) -> PathBuf {
        let stem = image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        image.with_file_name(format!("{stem}.{SIDECAR_SUFFIX}"))
    }
}

impl FaceLocator for SidecarLocator {
    fn locate(&self, frame: &SourceFrame<'_>) -> Result<Vec<FaceDetection>, FrameError> {
        let image = frame
            .path
            .ok_or_else(|| FrameError::Locator("sidecar lookup needs an image path".into()))?;
        let sidecar = Self::sidecar_path(image);
        let contents = fs::read_to_string(&sidecar).map_err(|err| {
            FrameError::Locator(format!("cannot read {}: {err}", sidecar.display()))
        })?;
        let parsed: SidecarContents = serde_json::from_str(&contents).map_err(|err| {
            FrameError::Locator(format!("cannot parse {}: {err}", sidecar.display()))
        })?;
        let faces = normalize(&parsed.into_records());
        debug!("{} -> {} face(s)", sidecar.display(), faces.len());
        Ok(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use tempfile::tempdir;

    fn record(x: f32) -> DetectionRecord {
        DetectionRecord {
            bbox: [x, 10.0, 50.0, 60.0],
            score: None,
            left_eye: None,
            right_eye: None,
            landmarks: None,
        }
    }

    #[test]
    fn explicit_eyes_are_ordered_by_x() {
        let rec = DetectionRecord {
            left_eye: Some([80.0, 30.0]),
            right_eye: Some([40.0, 32.0]),
            score: Some(0.8),
            ..record(20.0)
        };
        let det = rec.to_detection();
        assert_eq!(det.left_eye, Some(Landmark::new(40.0, 32.0)));
        assert_eq!(det.right_eye, Some(Landmark::new(80.0, 30.0)));
        assert_eq!(det.score, 0.8);
    }

    #[test]
    fn landmarks_supply_eyes_when_explicit_points_are_missing() {
        let rec: DetectionRecord = serde_json::from_str(
            r#"{"bbox":[10,10,50,60],"landmarks":[[45,30],[25,31],[35,40],[44,55],[26,55]]}"#,
        )
        .expect("parse record");
        let det = rec.to_detection();
        assert_eq!(det.left_eye, Some(Landmark::new(25.0, 31.0)));
        assert_eq!(det.right_eye, Some(Landmark::new(45.0, 30.0)));
        assert_eq!(det.score, 1.0);
    }

    #[test]
    fn bare_box_has_no_eyes() {
        let det = record(5.0).to_detection();
        assert!(det.left_eye.is_none() && det.right_eye.is_none());
    }

    #[test]
    fn manifest_matches_by_path_then_unique_name() {
        let dir = tempdir().expect("tempdir");
        let entries = vec![
            ImageDetections {
                image: "a/portrait.png".into(),
                detections: vec![record(1.0)],
            },
            ImageDetections {
                image: "b/portrait.png".into(),
                detections: vec![record(2.0), record(3.0)],
            },
            ImageDetections {
                image: "/elsewhere/solo.jpg".into(),
                detections: vec![],
            },
        ];
        let locator = ManifestLocator::from_entries(entries, dir.path());
        assert_eq!(locator.len(), 3);

        let image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let b_path = dir.path().join("b/portrait.png");
        let found = locator
            .locate(&SourceFrame::with_path(&image, &b_path))
            .expect("b entry");
        assert_eq!(found.len(), 2);

        let moved = Path::new("/tmp/other/solo.jpg");
        assert!(
            locator
                .locate(&SourceFrame::with_path(&image, moved))
                .expect("unique name")
                .is_empty()
        );

        let ambiguous = Path::new("/tmp/other/portrait.png");
        assert!(matches!(
            locator.locate(&SourceFrame::with_path(&image, ambiguous)),
            Err(FrameError::Locator(_))
        ));
    }

    #[test]
    fn manifest_file_round_trip() {
        let dir = tempdir().expect("tempdir");
        let manifest = dir.path().join("faces.json");
        let entries = vec![ImageDetections {
            image: "one.png".into(),
            detections: vec![record(4.0)],
        }];
        fs::write(&manifest, serde_json::to_string(&entries).expect("json")).expect("write");
        let locator = ManifestLocator::load(&manifest).expect("load");
        let image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let faces = locator
            .locate(&SourceFrame::with_path(&image, &dir.path().join("one.png")))
            .expect("entry");
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].bbox.x, 4.0);

        fs::write(&manifest, "{not json").expect("write");
        assert!(ManifestLocator::load(&manifest).is_err());
    }

    #[test]
    fn sidecar_accepts_arrays_and_entries() {
        let dir = tempdir().expect("tempdir");
        let image_path = dir.path().join("face.jpg");
        assert_eq!(
            SidecarLocator::sidecar_path(&image_path),
            dir.path().join("face.faces.json")
        );
        let image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let frame = SourceFrame::with_path(&image, &image_path);

        assert!(matches!(
            SidecarLocator.locate(&frame),
            Err(FrameError::Locator(_))
        ));

        fs::write(
            dir.path().join("face.faces.json"),
            r#"[{"bbox":[1,2,3,4]},{"bbox":[5,6,7,8],"score":0.5}]"#,
        )
        .expect("write");
        assert_eq!(SidecarLocator.locate(&frame).expect("array").len(), 2);

        fs::write(
            dir.path().join("face.faces.json"),
            r#"{"image":"face.jpg","detections":[{"bbox":[1,2,3,4]}]}"#,
        )
        .expect("write");
        assert_eq!(SidecarLocator.locate(&frame).expect("entry").len(), 1);
    }
}
