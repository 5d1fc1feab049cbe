//! Region crop preparation.
//!
//! A mapped pixel box is clamped to the page, cropped, cleaned of colored
//! overprint (seals, stamps) and handed to the engine as PNG bytes.

use std::io::Cursor;

use image::{imageops, ImageFormat, Rgb, RgbImage};

use crate::core::ExtractError;
use crate::processors::geometry::BoundingBox;

/// Channel spread above which a pixel counts as colored rather than gray.
const SATURATION_THRESHOLD: u8 = 28;

/// Clamps a pixel box to a valid crop rectangle on a `width` by `height`
/// page. The result always has at least one pixel in each dimension; callers
/// must reject zero-sized pages first.
pub(crate) fn clamp_crop_rect(bbox: &BoundingBox, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let left = bbox.x0.round().clamp(0.0, (width - 1) as f32) as u32;
    let top = bbox.y0.round().clamp(0.0, (height - 1) as f32) as u32;
    let crop_w = bbox.width().round().clamp(1.0, (width - left) as f32) as u32;
    let crop_h = bbox.height().round().clamp(1.0, (height - top) as f32) as u32;
    (left, top, crop_w, crop_h)
}

/// Replaces colored pixels with white, leaving grayscale strokes intact.
/// Red seals and blue stamps otherwise confuse recognition inside tight
/// crops.
pub(crate) fn whiten_colored_pixels(img: &RgbImage) -> RgbImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b] = pixel.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        if max - min > SATURATION_THRESHOLD {
            *pixel = Rgb([255, 255, 255]);
        }
    }
    out
}

/// Crops, cleans and PNG-encodes one region of the page.
pub(crate) fn prepare_region(
    page: &RgbImage,
    bbox: &BoundingBox,
) -> Result<Vec<u8>, ExtractError> {
    let (width, height) = page.dimensions();
    let (left, top, crop_w, crop_h) = clamp_crop_rect(bbox, width, height);
    let cropped = imageops::crop_imm(page, left, top, crop_w, crop_h).to_image();
    let cleaned = whiten_colored_pixels(&cropped);
    let mut buf = Cursor::new(Vec::new());
    cleaned.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}
