//! Helpers for writing processed images with configurable encoding.
//!
//! The encoders keep the channel layout of the image they are handed whenever the
//! target format can store it, so a grayscale source produces a grayscale output.

use crate::config::OutputConfig;

use anyhow::{Context, Result};
use image::{
    ColorType, DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat,
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType, PngEncoder},
        webp::WebPEncoder,
    },
};
use log::{debug, warn};
use std::{
    borrow::Cow,
    fs,
    io::{BufWriter, Cursor, Write},
    path::Path,
};

/// Canonical image formats supported by the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormatHint {
    #[default]
    Png,
    Jpeg,
    Webp,
    Bmp,
    Tiff,
}

impl ImageFormatHint {
    /// Determine format from a filesystem extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        ext.parse().ok()
    }

    /// Preferred file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }
}

impl std::str::FromStr for ImageFormatHint {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            "bmp" => Ok(Self::Bmp),
            "tif" | "tiff" => Ok(Self::Tiff),
            other => Err(format!("unknown image format '{other}'")),
        }
    }
}

/// Simplified PNG compression strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngCompression {
    Fast,
    Default,
    Best,
}

impl PngCompression {
    /// Parse compression string/level into a compression strategy.
    pub fn parse(input: &str) -> Self {
        let normalized = input.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "fast" => Self::Fast,
            "best" => Self::Best,
            "default" => Self::Default,
            _ => {
                if let Ok(level) = normalized.parse::<u8>() {
                    match level {
                        0..=3 => Self::Fast,
                        7..=9 => Self::Best,
                        _ => Self::Default,
                    }
                } else {
                    warn!(
                        "Unknown PNG compression '{}', falling back to default strategy",
                        input
                    );
                    Self::Default
                }
            }
        }
    }

    fn into_image(self) -> CompressionType {
        match self {
            Self::Fast => CompressionType::Fast,
            Self::Default => CompressionType::Default,
            Self::Best => CompressionType::Best,
        }
    }
}

/// Immutable encoding configuration derived from the user's output settings.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Forced output format; `None` follows the destination extension.
    pub format: Option<ImageFormatHint>,
    pub jpeg_quality: u8,
    pub png_compression: PngCompression,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self::from_output_config(&OutputConfig::default())
    }
}

impl OutputOptions {
    /// Build `OutputOptions` from persistent output settings.
    ///
    /// An empty or unrecognized format string keeps the input format.
    pub fn from_output_config(settings: &OutputConfig) -> Self {
        let format = if settings.format.trim().is_empty() {
            None
        } else {
            match settings.format.parse() {
                Ok(format) => Some(format),
                Err(err) => {
                    warn!("{err}; keeping the input format");
                    None
                }
            }
        };
        Self {
            format,
            jpeg_quality: settings.jpeg_quality.clamp(1, 100),
            png_compression: PngCompression::parse(&settings.png_compression),
        }
    }

    /// Resolve the format used for `path`.
    pub fn format_for(&self, path: &Path) -> ImageFormatHint {
        if let Some(format) = self.format {
            return format;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(ImageFormatHint::from_extension)
            .unwrap_or_default()
    }
}

/// Encode `image` and write it to `destination`, creating parent directories as needed.
pub fn save_dynamic_image(
    image: &DynamicImage,
    destination: &Path,
    options: &OutputOptions,
) -> Result<()> {
    if let Some(parent) = destination.parent().filter(|p| !p.exists()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let format = options.format_for(destination);
    debug!(
        "Saving {}x{} {:?} image to {} as {:?}",
        image.width(),
        image.height(),
        image.color(),
        destination.display(),
        format
    );

    let encoded = match format {
        ImageFormatHint::Png => encode_png(image, options.png_compression)?,
        ImageFormatHint::Jpeg => encode_jpeg(image, options.jpeg_quality)?,
        ImageFormatHint::Webp => encode_webp(image)?,
        ImageFormatHint::Bmp => encode_generic(image, ImageFormat::Bmp)?,
        ImageFormatHint::Tiff => encode_generic(image, ImageFormat::Tiff)?,
    };

    write_bytes(destination, &encoded)
}

fn encode_png(image: &DynamicImage, compression: PngCompression) -> Result<Vec<u8>> {
    // PNG has no float samples; everything else is stored as-is.
    let image: Cow<'_, DynamicImage> = match image.color() {
        ColorType::Rgb32F | ColorType::Rgba32F => {
            Cow::Owned(DynamicImage::ImageRgba16(image.to_rgba16()))
        }
        _ => Cow::Borrowed(image),
    };
    let mut buffer = Vec::new();
    {
        let encoder = PngEncoder::new_with_quality(
            &mut buffer,
            compression.into_image(),
            FilterType::Adaptive,
        );
        encoder
            .write_image(
                image.as_bytes(),
                image.width(),
                image.height(),
                image.color().into(),
            )
            .context("failed to encode PNG")?;
    }
    Ok(buffer)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    if matches!(
        image.color(),
        ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16
    ) {
        let luma = image.to_luma8();
        encoder
            .write_image(
                luma.as_raw(),
                luma.width(),
                luma.height(),
                ExtendedColorType::L8,
            )
            .context("failed to encode JPEG")?;
    } else {
        let rgb = image.to_rgb8();
        encoder
            .write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )
            .context("failed to encode JPEG")?;
    }
    Ok(buffer)
}

fn encode_webp(image: &DynamicImage) -> Result<Vec<u8>> {
    let image: Cow<'_, DynamicImage> = match image.color() {
        ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => {
            Cow::Borrowed(image)
        }
        ColorType::L16 => Cow::Owned(DynamicImage::ImageLuma8(image.to_luma8())),
        ColorType::La16 => Cow::Owned(DynamicImage::ImageLumaA8(image.to_luma_alpha8())),
        ColorType::Rgb16 | ColorType::Rgb32F => {
            Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8()))
        }
        _ => Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8())),
    };
    let mut buffer = Vec::new();
    {
        let encoder = WebPEncoder::new_lossless(&mut buffer);
        encoder
            .write_image(
                image.as_bytes(),
                image.width(),
                image.height(),
                image.color().into(),
            )
            .context("failed to encode WebP")?;
    }
    Ok(buffer)
}

fn encode_generic(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, format)
        .with_context(|| format!("failed to encode {format:?}"))?;
    Ok(cursor.into_inner())
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let file =
        fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}
