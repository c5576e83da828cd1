//! Boundary between the framing pipeline and whatever finds faces.
//!
//! Detection itself is not done here. A [`FaceLocator`] wraps an external detector, a
//! precomputed manifest or a test stub, and hands back every face it sees in one image.

use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView};

use crate::detection::FaceDetection;
use crate::error::FrameError;

/// One decoded image plus the path it came from, when there is one.
#[derive(Debug, Clone, Copy)]
pub struct SourceFrame<'a> {
    pub path: Option<&'a Path>,
    pub image: &'a DynamicImage,
}

impl<'a> SourceFrame<'a> {
    pub fn new(image: &'a DynamicImage) -> Self {
        Self { path: None, image }
    }

    pub fn with_path(image: &'a DynamicImage, path: &'a Path) -> Self {
        Self {
            path: Some(path),
            image,
        }
    }

    /// Image dimensions as `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Finds faces in a frame.
///
/// Implementations return all faces they find, in any order; the caller enforces the
/// single-face precondition. Locators are shared across worker threads.
pub trait FaceLocator: Send + Sync {
    fn locate(&self, frame: &SourceFrame<'_>) -> Result<Vec<FaceDetection>, FrameError>;
}

impl<L: FaceLocator + ?Sized> FaceLocator for &L {
    fn locate(&self, frame: &SourceFrame<'_>) -> Result<Vec<FaceDetection>, FrameError> {
        (**self).locate(frame)
    }
}

impl<L: FaceLocator + ?Sized> FaceLocator for Box<L> {
    fn locate(&self, frame: &SourceFrame<'_>) -> Result<Vec<FaceDetection>, FrameError> {
        (**self).locate(frame)
    }
}

impl<L: FaceLocator + ?Sized> FaceLocator for Arc<L> {
    fn locate(&self, frame: &SourceFrame<'_>) -> Result<Vec<FaceDetection>, FrameError> {
        (**self).locate(frame)
    }
}

/// A fixed answer for every frame.
impl FaceLocator for Vec<FaceDetection> {
    fn locate(&self, _frame: &SourceFrame<'_>) -> Result<Vec<FaceDetection>, FrameError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BoundingBox;
    use image::RgbImage;

    #[test]
    fn fixed_locator_is_usable_through_pointers() {
        let face = FaceDetection::new(BoundingBox {
            x: 1.0,
            y: 1.0,
            width: 4.0,
            height: 4.0,
        });
        let image = DynamicImage::ImageRgb8(RgbImage::new(8, 8));
        let frame = SourceFrame::new(&image);

        let boxed: Box<dyn FaceLocator> = Box::new(vec![face.clone()]);
        assert_eq!(boxed.locate(&frame).unwrap(), vec![face.clone()]);

        let shared: Arc<dyn FaceLocator> = Arc::new(Vec::<FaceDetection>::new());
        assert!((&shared).locate(&frame).unwrap().is_empty());
        assert_eq!(frame.dimensions(), (8, 8));
        assert!(frame.path.is_none());
    }
}
