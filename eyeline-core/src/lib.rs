//! Face-aware square crop primitives.
//!
//! This crate turns a single face detection into the largest square crop that keeps the
//! face horizontally centred with its eye line on the upper third, then resamples that
//! crop to a fixed output size.

/// Crop geometry engine (margin bounds, fallback, rounding).
pub mod cropper;
/// Face detection records and single-face selection.
pub mod detection;
/// Per-image error kinds.
pub mod error;
/// Per-image framing pipeline tying a locator to the geometry engine.
pub mod framing;
/// Face locator abstraction for external detectors.
pub mod locator;
/// Standard output size presets for training crops.
pub mod presets;
/// Crop extraction and rescaling.
pub mod resample;

pub use crate::cropper::{
    CropPlan, CropRectangle, CropSettings, EyeLineSource, FaceAnchors, MarginBounds,
    compute_crop, plan_crop,
};
pub use crate::detection::{BoundingBox, FaceDetection, Landmark, select_single_face};
pub use crate::error::FrameError;
pub use crate::framing::{FaceFramer, FramedFace, frame_face};
pub use crate::locator::{FaceLocator, SourceFrame};
pub use crate::presets::{OutputPreset, preset_by_name, standard_presets};
pub use crate::resample::{filter_for, resample};

/// Returns the crate version for diagnostics.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
