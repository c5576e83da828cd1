//! Crop geometry for face-anchored square crops.
//!
//! The crop side `S` is the only free variable: once it is chosen, horizontal centring
//! fixes the left edge at `face_center_x - S/2` and the eye-line constraint fixes the top
//! edge at `eye_line_y - f·S`. Keeping those edges inside the image bounds `S` from above
//! on each of the four sides, so the largest admissible square is simply the smallest of
//! the four [`MarginBounds`]. When that square is too small to be useful the engine falls
//! back to a fixed minimum side and clamps the position instead.

use crate::detection::FaceDetection;
use crate::error::FrameError;

use eyeline_utils::config::{CropConfig, Interpolation};
use log::{debug, trace};

/// Settings controlling crop geometry and the output size.
#[derive(Debug, Clone, PartialEq)]
pub struct CropSettings {
    /// Side length of the square output in pixels.
    pub target_size: u32,
    /// Where the eye line sits, as a fraction of the crop height from the top.
    /// Must lie strictly between 0 and 1.
    pub vertical_fraction: f32,
    /// Minimum-viable crop side expressed as a multiple of the face width.
    pub margin_factor: f32,
    /// Eye-line estimate (fraction of the box height from its top) used when the
    /// detection carries no usable eye centres.
    pub eye_line_fallback: f32,
    /// Filter used when the crop is resampled.
    pub interpolation: Interpolation,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self::from(&CropConfig::default())
    }
}

impl From<&CropConfig> for CropSettings {
    fn from(config: &CropConfig) -> Self {
        Self {
            target_size: config.target_size,
            vertical_fraction: config.vertical_fraction,
            margin_factor: config.margin_factor,
            eye_line_fallback: config.eye_line_fallback,
            interpolation: config.interpolation,
        }
    }
}

impl CropSettings {
    /// Check the ranges the geometry relies on.
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.target_size == 0 {
            return Err(FrameError::InvalidSettings(
                "target size must be greater than zero".into(),
            ));
        }
        let f = self.vertical_fraction;
        if !(f.is_finite() && f > 0.0 && f < 1.0) {
            return Err(FrameError::InvalidSettings(format!(
                "vertical fraction must lie in (0, 1), got {f}"
            )));
        }
        if !(self.margin_factor.is_finite() && self.margin_factor > 0.0) {
            return Err(FrameError::InvalidSettings(format!(
                "margin factor must be positive, got {}",
                self.margin_factor
            )));
        }
        let e = self.eye_line_fallback;
        if !(e.is_finite() && (0.0..=1.0).contains(&e)) {
            return Err(FrameError::InvalidSettings(format!(
                "eye line fallback must lie in [0, 1], got {e}"
            )));
        }
        Ok(())
    }
}

/// Square crop in source image coordinates, always fully inside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRectangle {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Side length.
    pub size: u32,
}

impl CropRectangle {
    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.size
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.size
    }

    /// Horizontal midpoint.
    pub fn center_x(&self) -> f32 {
        self.x as f32 + self.size as f32 * 0.5
    }

    /// Returns `true` when the square is non-empty and lies inside a `width` x `height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.size > 0
            && u64::from(self.x) + u64::from(self.size) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.size) <= u64::from(height)
    }
}

/// Where the eye line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeLineSource {
    /// Mean y of both detected eye centres.
    EyeCenters,
    /// Fixed fraction down the face box.
    Estimated,
}

/// Anchor points the crop is positioned around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceAnchors {
    /// Horizontal centre of the face box.
    pub center_x: f32,
    /// Vertical position of the eye line.
    pub eye_line_y: f32,
    pub eye_source: EyeLineSource,
}

impl FaceAnchors {
    /// Derive anchors from a detection.
    ///
    /// Eye centres are only trusted when both are present and inside the image.
    pub fn from_detection(
        face: &FaceDetection,
        img_w: u32,
        img_h: u32,
        eye_line_fallback: f32,
    ) -> Self {
        let center_x = face.bbox.center_x();
        match face.eye_centers(img_w, img_h) {
            Some((left, right)) => Self {
                center_x,
                eye_line_y: (left.y + right.y) * 0.5,
                eye_source: EyeLineSource::EyeCenters,
            },
            None => Self {
                center_x,
                eye_line_y: face.bbox.height.mul_add(eye_line_fallback, face.bbox.y),
                eye_source: EyeLineSource::Estimated,
            },
        }
    }
}

/// Largest crop side permitted by the space on each side of the anchors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginBounds {
    /// `2 · center_x`
    pub left: f32,
    /// `2 · (W − center_x)`
    pub right: f32,
    /// `eye_line_y / f`
    pub top: f32,
    /// `(H − eye_line_y) / (1 − f)`
    pub bottom: f32,
}

impl MarginBounds {
    /// Compute the four bounds for a `img_w` x `img_h` image.
    pub fn new(img_w: u32, img_h: u32, anchors: &FaceAnchors, vertical_fraction: f32) -> Self {
        Self {
            left: anchors.center_x * 2.0,
            right: (img_w as f32 - anchors.center_x) * 2.0,
            top: anchors.eye_line_y / vertical_fraction,
            bottom: (img_h as f32 - anchors.eye_line_y) / (1.0 - vertical_fraction),
        }
    }

    /// The binding constraint: the largest side satisfying all four bounds.
    pub fn limit(&self) -> f32 {
        self.left.min(self.right).min(self.top).min(self.bottom)
    }
}

/// Full result of the geometry engine, including the intermediate values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropPlan {
    /// Final crop.
    pub rect: CropRectangle,
    pub anchors: FaceAnchors,
    pub bounds: MarginBounds,
    /// Side the fallback would use; also the threshold that triggers it.
    pub minimum_side: f32,
    /// `true` when the minimum-viable crop replaced the margin-bound optimum.
    pub fallback: bool,
}

/// Calculate the square crop for `face` inside an `img_w` x `img_h` image.
///
/// Convenience wrapper over [`plan_crop`] for callers that only need the rectangle.
///
/// # Examples
///
/// ```rust
/// # use eyeline_core::{compute_crop, BoundingBox, CropSettings, FaceDetection, Landmark};
/// let face = FaceDetection::new(BoundingBox {
///     x: 400.0,
///     y: 300.0,
///     width: 200.0,
///     height: 200.0,
/// })
/// .with_eyes(Landmark::new(450.0, 370.0), Landmark::new(550.0, 370.0));
///
/// let crop = compute_crop(1000, 1000, &face, &CropSettings::default()).unwrap();
/// // The bottom margin binds: (1000 - 370) / (2/3) = 945.
/// assert_eq!(crop.size, 945);
/// assert_eq!(crop.x, 28);
/// assert_eq!(crop.y, 55);
/// ```
pub fn compute_crop(
    img_w: u32,
    img_h: u32,
    face: &FaceDetection,
    settings: &CropSettings,
) -> Result<CropRectangle, FrameError> {
    plan_crop(img_w, img_h, face, settings).map(|plan| plan.rect)
}

/// Calculate the crop plan for `face` inside an `img_w` x `img_h` image.
///
/// The algorithm proceeds as follows:
/// 1. Validate settings, image size and the detection box.
/// 2. Derive the horizontal anchor (box centre) and the eye line (mean eye height,
///    or `eye_line_fallback` down the box).
/// 3. Compute the four [`MarginBounds`]; their minimum `S*` is the largest square
///    that honours both anchors without leaving the image.
/// 4. If `S*` is below the minimum-viable side (`margin_factor · w`, at least the box
///    extent, at most the short image side) use that side instead.
/// 5. Round side and position, clamping the position into the image. In fallback mode
///    the clamp is what relaxes the eye-line placement.
///
/// For valid single-face input this never fails; errors only report bad input.
pub fn plan_crop(
    img_w: u32,
    img_h: u32,
    face: &FaceDetection,
    settings: &CropSettings,
) -> Result<CropPlan, FrameError> {
    settings.validate()?;
    if img_w == 0 || img_h == 0 {
        return Err(FrameError::UnsupportedImage(format!(
            "image has zero dimensions {img_w}x{img_h}"
        )));
    }
    face.validate(img_w, img_h)?;

    let f = settings.vertical_fraction;
    let anchors = FaceAnchors::from_detection(face, img_w, img_h, settings.eye_line_fallback);
    let bounds = MarginBounds::new(img_w, img_h, &anchors, f);
    let optimum = bounds.limit();
    let minimum_side = minimum_side(face, img_w, img_h, settings.margin_factor);

    let fallback = optimum < minimum_side;
    let side = if fallback { minimum_side } else { optimum };
    let rect = place_square(img_w, img_h, &anchors, side, f);

    trace!(
        "crop bounds for {img_w}x{img_h}: left={:.1} right={:.1} top={:.1} bottom={:.1}",
        bounds.left, bounds.right, bounds.top, bounds.bottom
    );
    if fallback {
        debug!(
            "margin-bound side {optimum:.1} below minimum {minimum_side:.1}; using fallback crop {rect:?}"
        );
    }

    Ok(CropPlan {
        rect,
        anchors,
        bounds,
        minimum_side,
        fallback,
    })
}

/// Smallest side worth producing: `margin_factor · w`, never below the face box extent
/// and never above the short side of the image.
fn minimum_side(face: &FaceDetection, img_w: u32, img_h: u32, margin_factor: f32) -> f32 {
    let extent = face.bbox.width.max(face.bbox.height);
    (face.bbox.width * margin_factor)
        .max(extent)
        .min(img_w.min(img_h) as f32)
}

/// Round `side` and position the square on the anchors, clamped to the image.
fn place_square(
    img_w: u32,
    img_h: u32,
    anchors: &FaceAnchors,
    side: f32,
    vertical_fraction: f32,
) -> CropRectangle {
    let max_side = img_w.min(img_h);
    let size = (side.round().max(1.0) as u32).min(max_side);
    let size_f = size as f32;

    let left = (-size_f).mul_add(0.5, anchors.center_x);
    let top = (-size_f).mul_add(vertical_fraction, anchors.eye_line_y);

    CropRectangle {
        x: clamp_edge(left, img_w - size),
        y: clamp_edge(top, img_h - size),
        size,
    }
}

fn clamp_edge(value: f32, max: u32) -> u32 {
    value.round().clamp(0.0, max as f32) as u32
}
