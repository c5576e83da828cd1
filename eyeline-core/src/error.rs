use thiserror::Error;

/// Reasons a single image cannot be framed.
///
/// Every variant is scoped to one image; batch callers record it and move on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("no face detected")]
    NoFaceDetected,

    #[error("expected exactly one face, found {count}")]
    AmbiguousFace { count: usize },

    #[error("invalid face detection: {0}")]
    InvalidDetection(String),

    #[error("unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("invalid crop settings: {0}")]
    InvalidSettings(String),

    #[error("crop {size}px at ({x}, {y}) does not fit a {width}x{height} image")]
    CropOutOfBounds {
        x: u32,
        y: u32,
        size: u32,
        width: u32,
        height: u32,
    },

    #[error("face locator failed: {0}")]
    Locator(String),
}

impl FrameError {
    /// Short machine-readable label used in batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            FrameError::NoFaceDetected => "no_face_detected",
            FrameError::AmbiguousFace { .. } => "ambiguous_face",
            FrameError::InvalidDetection(_) => "invalid_detection",
            FrameError::UnsupportedImage(_) => "unsupported_image",
            FrameError::InvalidSettings(_) => "invalid_settings",
            FrameError::CropOutOfBounds { .. } => "crop_out_of_bounds",
            FrameError::Locator(_) => "locator_error",
        }
    }

    /// Returns `true` for outcomes that mean "this photo is not usable" rather than
    /// "something went wrong": the image is skipped, not counted as a failure.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            FrameError::NoFaceDetected
                | FrameError::AmbiguousFace { .. }
                | FrameError::InvalidDetection(_)
        )
    }
}
