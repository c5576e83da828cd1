//! Shared helpers for CLI integration tests.
#![allow(dead_code)]

use std::{fs, io::Result, path::Path};

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use serde_json::{Value, json};

/// Write a synthetic RGB photo of the given size.
pub fn write_rgb(path: &Path, width: u32, height: u32) -> image::ImageResult<()> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 251) as u8, (y % 241) as u8, ((x + y) % 233) as u8])
    });
    DynamicImage::ImageRgb8(img).save(path)
}

/// Write a synthetic grayscale photo of the given size.
pub fn write_gray(path: &Path, width: u32, height: u32) -> image::ImageResult<()> {
    GrayImage::from_pixel(width, height, Luma([140])).save(path)
}

/// Record for a face with explicit eye points.
pub fn face_with_eyes(bbox: [f32; 4], left: [f32; 2], right: [f32; 2]) -> Value {
    json!({ "bbox": bbox, "score": 0.97, "left_eye": left, "right_eye": right })
}

/// Record for a face with a box only.
pub fn face_box(bbox: [f32; 4]) -> Value {
    json!({ "bbox": bbox })
}

/// Write a detection manifest from `(image name, records)` pairs.
pub fn write_manifest(path: &Path, entries: &[(&str, Vec<Value>)]) -> Result<()> {
    let entries: Vec<Value> = entries
        .iter()
        .map(|(image, records)| json!({ "image": image, "detections": records }))
        .collect();
    fs::write(path, serde_json::to_string_pretty(&entries)?)
}
