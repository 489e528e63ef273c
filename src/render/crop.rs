//! Evidence cropping for display.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::models::BoundingBox;

use super::RenderError;

/// Side of the normalised coordinate space boxes are expressed in.
const NORMALIZED_SCALE: f64 = 1000.0;

/// Cuts the region a finding points at out of a page image.
pub trait EvidenceCropper: Send + Sync {
    /// Crop encoded image bytes, returning PNG bytes.
    fn crop(&self, image: &[u8], bbox: &BoundingBox) -> Result<Vec<u8>, RenderError>;
}

/// Crops with padding around the box so the surrounding text stays readable.
#[derive(Debug, Clone)]
pub struct PaddedCropper {
    /// Vertical padding as a fraction of box height, on each side.
    pub vertical_padding: f64,
    /// Horizontal padding as a fraction of box width, on each side.
    pub horizontal_padding: f64,
    /// Crops shorter than this are upscaled to it.
    pub min_height: u32,
}

impl Default for PaddedCropper {
    fn default() -> Self {
        Self {
            vertical_padding: 0.5,
            horizontal_padding: 0.3,
            min_height: 180,
        }
    }
}

impl PaddedCropper {
    /// Pixel rectangle `(x, y, width, height)` for a box on a `width`x`height` image.
    ///
    /// Always at least 1x1 and inside the image.
    pub fn pixel_rect(&self, bbox: &BoundingBox, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let pad_x = bbox.width * self.horizontal_padding;
        let pad_y = bbox.height * self.vertical_padding;

        let to_px = |v: f64, size: u32| -> u32 {
            (v / NORMALIZED_SCALE * f64::from(size)).clamp(0.0, f64::from(size)) as u32
        };

        let max_x = width.saturating_sub(1);
        let max_y = height.saturating_sub(1);
        let x0 = to_px(bbox.x - pad_x, width).min(max_x);
        let y0 = to_px(bbox.y - pad_y, height).min(max_y);
        let x1 = to_px((bbox.right() + pad_x).ceil(), width);
        let y1 = to_px((bbox.bottom() + pad_y).ceil(), height);

        (x0, y0, x1.saturating_sub(x0).max(1), y1.saturating_sub(y0).max(1))
    }

    pub fn crop_image(&self, image: &DynamicImage, bbox: &BoundingBox) -> DynamicImage {
        let (width, height) = image.dimensions();
        let (x, y, w, h) = self.pixel_rect(bbox, width, height);
        let cropped = image.crop_imm(x, y, w, h);

        if h >= self.min_height {
            return cropped;
        }
        let scale = f64::from(self.min_height) / f64::from(h);
        let new_width = ((f64::from(w) * scale).round() as u32).max(1);
        cropped.resize_exact(new_width, self.min_height, FilterType::Lanczos3)
    }
}

impl EvidenceCropper for PaddedCropper {
    fn crop(&self, image: &[u8], bbox: &BoundingBox) -> Result<Vec<u8>, RenderError> {
        let decoded = image::load_from_memory(image)
            .map_err(|e| RenderError::Failed(format!("Failed to decode image: {e}")))?;
        let cropped = self.crop_image(&decoded, bbox);

        let mut out = Vec::new();
        cropped
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .map_err(|e| RenderError::Failed(format!("Failed to encode crop: {e}")))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn bbox(x: f64, y: f64, w: f64, h: f64) -> BoundingBox {
        BoundingBox::from_xywh([x, y, w, h]).unwrap()
    }

    #[test]
    fn test_pixel_rect_padding() {
        let cropper = PaddedCropper::default();
        // 100x100 box at (400, 400) on a 1000x1000 image
        let rect = cropper.pixel_rect(&bbox(400.0, 400.0, 100.0, 100.0), 1000, 1000);
        assert_eq!(rect, (370, 350, 160, 200));
    }

    #[test]
    fn test_pixel_rect_clamped() {
        let cropper = PaddedCropper::default();
        let (x, y, w, h) = cropper.pixel_rect(&bbox(950.0, 0.0, 50.0, 20.0), 200, 100);
        assert!(x + w <= 200);
        assert!(y + h <= 100);
        assert_eq!(y, 0);
    }

    #[test]
    fn test_degenerate_rect_is_one_pixel() {
        let cropper = PaddedCropper::default();
        let (_, _, w, h) = cropper.pixel_rect(&bbox(999.9, 999.9, 0.01, 0.01), 10, 10);
        assert!(w >= 1 && h >= 1);
    }

    #[test]
    fn test_small_crop_is_upscaled() {
        let cropper = PaddedCropper::default();
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(400, 400, Rgb([255, 255, 255])));
        let out = cropper.crop_image(&img, &bbox(100.0, 100.0, 100.0, 50.0));
        assert_eq!(out.height(), 180);
    }

    #[test]
    fn test_crop_bytes_round_trip() {
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(50, 50, Rgb([0, 0, 0])));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).unwrap();

        let out = PaddedCropper::default()
            .crop(&png, &bbox(0.0, 0.0, 500.0, 500.0))
            .unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.height(), 180);
    }

    #[test]
    fn test_crop_rejects_garbage() {
        let err = PaddedCropper::default()
            .crop(b"not an image", &bbox(0.0, 0.0, 10.0, 10.0))
            .unwrap_err();
        assert!(matches!(err, RenderError::Failed(_)));
    }
}
