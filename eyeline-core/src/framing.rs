//! Per-image framing: locate, select, plan, resample.

use image::{DynamicImage, GenericImageView};

use crate::cropper::{CropPlan, CropSettings, plan_crop};
use crate::detection::{FaceDetection, select_single_face};
use crate::error::FrameError;
use crate::locator::{FaceLocator, SourceFrame};
use crate::resample::resample;
use eyeline_utils::{Stage, time_stage};

/// A normalized crop together with the plan that produced it.
#[derive(Debug, Clone)]
pub struct FramedFace {
    pub plan: CropPlan,
    /// Square image of `target_size` pixels per side.
    pub image: DynamicImage,
}

/// Frame a single known face: plan the crop and resample it.
pub fn frame_face(
    image: &DynamicImage,
    face: &FaceDetection,
    settings: &CropSettings,
) -> Result<FramedFace, FrameError> {
    let (width, height) = image.dimensions();
    let plan = plan_crop(width, height, face, settings)?;
    let mut timer = time_stage(Stage::Resample);
    if plan.fallback {
        timer.mark_fallback();
    }
    let image = resample(image, &plan.rect, settings.target_size, settings.interpolation)?;
    Ok(FramedFace { plan, image })
}

/// Couples a [`FaceLocator`] with crop settings.
///
/// One framer serves a whole batch; it holds no per-image state.
#[derive(Debug, Clone)]
pub struct FaceFramer<L> {
    locator: L,
    settings: CropSettings,
}

impl<L: FaceLocator> FaceFramer<L> {
    /// Create a framer, rejecting settings the geometry cannot use.
    pub fn new(locator: L, settings: CropSettings) -> Result<Self, FrameError> {
        settings.validate()?;
        Ok(Self { locator, settings })
    }

    pub fn settings(&self) -> &CropSettings {
        &self.settings
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    /// Locate the single face in `frame` and compute its crop without resampling.
    pub fn plan(&self, frame: &SourceFrame<'_>) -> Result<CropPlan, FrameError> {
        let face = self.single_face(frame)?;
        let (width, height) = frame.dimensions();
        plan_crop(width, height, &face, &self.settings)
    }

    /// Locate the single face in `frame` and produce the normalized crop.
    pub fn frame(&self, frame: &SourceFrame<'_>) -> Result<FramedFace, FrameError> {
        let mut timer = time_stage(Stage::Frame);
        let face = self.single_face(frame)?;
        let framed = frame_face(frame.image, &face, &self.settings)?;
        if framed.plan.fallback {
            timer.mark_fallback();
        }
        Ok(framed)
    }

    fn single_face(&self, frame: &SourceFrame<'_>) -> Result<FaceDetection, FrameError> {
        let detections = {
            let _timer = time_stage(Stage::Locate);
            self.locator.locate(frame)?
        };
        select_single_face(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BoundingBox, Landmark};
    use image::RgbImage;

    fn scenario_a() -> FaceDetection {
        FaceDetection::new(BoundingBox {
            x: 400.0,
            y: 300.0,
            width: 200.0,
            height: 200.0,
        })
        .with_eyes(Landmark::new(450.0, 370.0), Landmark::new(550.0, 370.0))
    }

    #[test]
    fn frames_single_face_to_target_size() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(1000, 1000));
        let framer = FaceFramer::new(vec![scenario_a()], CropSettings::default()).unwrap();
        let framed = framer.frame(&SourceFrame::new(&image)).unwrap();
        assert_eq!(framed.image.dimensions(), (512, 512));
        assert_eq!(framed.plan.rect.size, 945);
    }

    #[test]
    fn zero_or_many_faces_are_rejected() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(1000, 1000));
        let frame = SourceFrame::new(&image);

        let none = FaceFramer::new(Vec::<FaceDetection>::new(), CropSettings::default()).unwrap();
        assert_eq!(none.plan(&frame), Err(FrameError::NoFaceDetected));

        let two = FaceFramer::new(vec![scenario_a(), scenario_a()], CropSettings::default())
            .unwrap();
        assert_eq!(
            two.frame(&frame).unwrap_err(),
            FrameError::AmbiguousFace { count: 2 }
        );
    }

    #[test]
    fn invalid_settings_rejected_up_front() {
        let settings = CropSettings {
            vertical_fraction: 1.5,
            ..CropSettings::default()
        };
        assert!(matches!(
            FaceFramer::new(Vec::<FaceDetection>::new(), settings),
            Err(FrameError::InvalidSettings(_))
        ));
    }
}
