//! Face detection records consumed by the geometry engine.
//!
//! Detectors report faces in many shapes (five-point landmarks, explicit eye pairs, bare
//! boxes). Callers normalize them into [`FaceDetection`] before any geometry runs.

use crate::error::FrameError;

/// Slack allowed when checking that a box lies inside the image, in pixels.
const BOUNDS_EPSILON: f32 = 1e-3;

/// Axis-aligned bounding box in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// The x-coordinate of the top-left corner.
    pub x: f32,
    /// The y-coordinate of the top-left corner.
    pub y: f32,
    /// The width of the box.
    pub width: f32,
    /// The height of the box.
    pub height: f32,
}

impl BoundingBox {
    /// Horizontal centre of the box.
    pub fn center_x(&self) -> f32 {
        self.width.mul_add(0.5, self.x)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Facial landmark coordinate (x, y) in image space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    /// The x-coordinate of the landmark.
    pub x: f32,
    /// The y-coordinate of the landmark.
    pub y: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn inside(&self, img_w: u32, img_h: u32) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && (0.0..=img_w as f32).contains(&self.x)
            && (0.0..=img_h as f32).contains(&self.y)
    }
}

/// A single face: bounding box, optional eye centres and detector confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDetection {
    /// The bounding box of the detected face.
    pub bbox: BoundingBox,
    /// Centre of the eye on the image-left side.
    pub left_eye: Option<Landmark>,
    /// Centre of the eye on the image-right side.
    pub right_eye: Option<Landmark>,
    /// The confidence score of the detection.
    pub score: f32,
}

impl FaceDetection {
    /// A detection with a box only; the eye line will be estimated.
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            left_eye: None,
            right_eye: None,
            score: 1.0,
        }
    }

    /// Attach eye centres, ordering them by x so `left_eye` is always image-left.
    pub fn with_eyes(mut self, a: Landmark, b: Landmark) -> Self {
        let (left, right) = if a.x <= b.x { (a, b) } else { (b, a) };
        self.left_eye = Some(left);
        self.right_eye = Some(right);
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    /// Build a detection from a five-point landmark set in detector order
    /// (right eye, left eye, nose tip, right mouth corner, left mouth corner).
    pub fn from_landmarks(bbox: BoundingBox, landmarks: &[Landmark; 5], score: f32) -> Self {
        Self::new(bbox)
            .with_eyes(landmarks[0], landmarks[1])
            .with_score(score)
    }

    /// Both eye centres when they are present and lie inside the image.
    pub fn eye_centers(&self, img_w: u32, img_h: u32) -> Option<(Landmark, Landmark)> {
        match (self.left_eye, self.right_eye) {
            (Some(left), Some(right)) if left.inside(img_w, img_h) && right.inside(img_w, img_h) => {
                Some((left, right))
            }
            _ => None,
        }
    }

    /// Reject boxes a detector could only produce by mistake.
    pub fn validate(&self, img_w: u32, img_h: u32) -> Result<(), FrameError> {
        let bbox = &self.bbox;
        if !bbox.is_finite() {
            return Err(FrameError::InvalidDetection(format!(
                "non-finite bounding box {bbox:?}"
            )));
        }
        if bbox.width <= 0.0 || bbox.height <= 0.0 {
            return Err(FrameError::InvalidDetection(format!(
                "bounding box has non-positive size {}x{}",
                bbox.width, bbox.height
            )));
        }
        let max_x = img_w as f32 + BOUNDS_EPSILON;
        let max_y = img_h as f32 + BOUNDS_EPSILON;
        if bbox.x < -BOUNDS_EPSILON
            || bbox.y < -BOUNDS_EPSILON
            || bbox.x + bbox.width > max_x
            || bbox.y + bbox.height > max_y
        {
            return Err(FrameError::InvalidDetection(format!(
                "bounding box ({}, {}, {}, {}) exceeds the {}x{} image",
                bbox.x, bbox.y, bbox.width, bbox.height, img_w, img_h
            )));
        }
        Ok(())
    }
}

/// Enforce the one-face-per-photo precondition.
///
/// Two or more faces yield [`FrameError::AmbiguousFace`]; none is picked automatically.
pub fn select_single_face(
    mut detections: Vec<FaceDetection>,
) -> Result<FaceDetection, FrameError> {
    match detections.len() {
        0 => Err(FrameError::NoFaceDetected),
        1 => Ok(detections.remove(0)),
        count => Err(FrameError::AmbiguousFace { count }),
    }
}
