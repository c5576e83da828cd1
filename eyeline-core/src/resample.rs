//! Crop extraction and rescaling.
//!
//! The crop is cut from the source with [`DynamicImage::crop_imm`] and scaled with
//! [`DynamicImage::resize_exact`], so the output keeps the source colour layout
//! (grayscale stays grayscale, alpha survives).

use crate::cropper::CropRectangle;
use crate::error::FrameError;

use eyeline_utils::config::Interpolation;
use image::{DynamicImage, GenericImageView, imageops::FilterType};
use log::trace;

/// Resolve the resampling filter for scaling a `src_size` square to `dst_size`.
///
/// `Auto` picks an area-averaging filter when shrinking and a cubic filter when
/// enlarging.
pub fn filter_for(interpolation: Interpolation, src_size: u32, dst_size: u32) -> FilterType {
    match interpolation {
        Interpolation::Auto if dst_size < src_size => FilterType::Triangle,
        Interpolation::Auto => FilterType::CatmullRom,
        Interpolation::Nearest => FilterType::Nearest,
        Interpolation::Bilinear => FilterType::Triangle,
        Interpolation::Bicubic => FilterType::CatmullRom,
        Interpolation::Lanczos => FilterType::Lanczos3,
    }
}

/// Extract `rect` from `image` and scale it to `target_size` x `target_size`.
///
/// A crop that already has the target size is returned unscaled.
pub fn resample(
    image: &DynamicImage,
    rect: &CropRectangle,
    target_size: u32,
    interpolation: Interpolation,
) -> Result<DynamicImage, FrameError> {
    if target_size == 0 {
        return Err(FrameError::InvalidSettings(
            "target size must be greater than zero".into(),
        ));
    }
    let (width, height) = image.dimensions();
    if !rect.fits_within(width, height) {
        return Err(FrameError::CropOutOfBounds {
            x: rect.x,
            y: rect.y,
            size: rect.size,
            width,
            height,
        });
    }

    let region = image.crop_imm(rect.x, rect.y, rect.size, rect.size);
    if rect.size == target_size {
        return Ok(region);
    }

    let filter = filter_for(interpolation, rect.size, target_size);
    trace!(
        "resampling {}px crop to {target_size}px with {filter:?}",
        rect.size
    );
    Ok(region.resize_exact(target_size, target_size, filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 64, 255])
        }))
    }

    #[test]
    fn auto_filter_depends_on_direction() {
        assert_eq!(
            filter_for(Interpolation::Auto, 945, 512),
            FilterType::Triangle
        );
        assert_eq!(
            filter_for(Interpolation::Auto, 132, 512),
            FilterType::CatmullRom
        );
        assert_eq!(
            filter_for(Interpolation::Lanczos, 132, 512),
            FilterType::Lanczos3
        );
        assert_eq!(
            filter_for(Interpolation::Nearest, 945, 512),
            FilterType::Nearest
        );
    }

    #[test]
    fn downscale_produces_target_size() {
        let image = gradient(1000, 1000);
        let rect = CropRectangle {
            x: 28,
            y: 55,
            size: 945,
        };
        let out = resample(&image, &rect, 512, Interpolation::Auto).unwrap();
        assert_eq!(out.dimensions(), (512, 512));
    }

    #[test]
    fn upscale_produces_target_size() {
        let image = gradient(200, 150);
        let rect = CropRectangle {
            x: 10,
            y: 0,
            size: 132,
        };
        let out = resample(&image, &rect, 512, Interpolation::Bicubic).unwrap();
        assert_eq!(out.dimensions(), (512, 512));
    }

    #[test]
    fn matching_size_copies_pixels() {
        let image = gradient(64, 64);
        let rect = CropRectangle {
            x: 8,
            y: 4,
            size: 32,
        };
        let out = resample(&image, &rect, 32, Interpolation::Auto).unwrap();
        assert_eq!(out.get_pixel(0, 0), image.get_pixel(8, 4));
        assert_eq!(out.get_pixel(31, 31), image.get_pixel(39, 35));
    }

    #[test]
    fn grayscale_stays_grayscale() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(80, 80, Luma([90])));
        let rect = CropRectangle {
            x: 0,
            y: 0,
            size: 80,
        };
        let out = resample(&image, &rect, 40, Interpolation::Auto).unwrap();
        assert!(matches!(out, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn rejects_out_of_bounds_crop() {
        let image = gradient(100, 100);
        let rect = CropRectangle {
            x: 60,
            y: 0,
            size: 50,
        };
        let err = resample(&image, &rect, 32, Interpolation::Auto).unwrap_err();
        assert!(matches!(err, FrameError::CropOutOfBounds { .. }));
    }

    #[test]
    fn rejects_zero_target() {
        let image = gradient(10, 10);
        let rect = CropRectangle {
            x: 0,
            y: 0,
            size: 10,
        };
        assert!(matches!(
            resample(&image, &rect, 0, Interpolation::Auto),
            Err(FrameError::InvalidSettings(_))
        ));
    }
}
