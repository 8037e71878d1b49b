//! Freehand signature capture
//!
//! A drawing surface fed by pointer/touch events. Strokes are rendered
//! straight into the raster as they arrive; the surface is the sole source of
//! truth and no stroke geometry is retained once serialized. Pointer-up
//! serializes the surface to a PNG and emits it; `clear` resets to the
//! baseline guide and emits nothing.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, Luma};

use crate::errors::VerifyError;
use crate::types::{EncodedImage, ImageEncoding};

const INK: Luma<u8> = Luma([20u8]);
const PAPER: Luma<u8> = Luma([255u8]);
const GUIDE: Luma<u8> = Luma([200u8]);

/// Freehand drawing surface producing a signed bitmap
pub struct SignatureCapture {
    canvas: GrayImage,
    width: u32,
    height: u32,
    last_point: Option<(f32, f32)>,
    has_ink: bool,
}

impl SignatureCapture {
    pub fn new(width: u32, height: u32) -> Self {
        let mut capture = Self {
            canvas: GrayImage::from_pixel(width, height, PAPER),
            width,
            height,
            last_point: None,
            has_ink: false,
        };
        capture.draw_guide();
        capture
    }

    /// Begin a stroke
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.plot(x, y);
        self.last_point = Some((x, y));
        self.has_ink = true;
    }

    /// Extend the active stroke; ignored when no stroke is active
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if let Some((px, py)) = self.last_point {
            self.draw_segment(px, py, x, y);
            self.last_point = Some((x, y));
        }
    }

    /// Finalize the stroke and serialize the surface
    ///
    /// Emits the signed bitmap to the caller; an untouched surface emits
    /// nothing.
    pub fn pointer_up(&mut self) -> Result<Option<EncodedImage>, VerifyError> {
        self.last_point = None;
        self.serialize()
    }

    /// Serialize the current surface if it carries ink
    pub fn serialize(&self) -> Result<Option<EncodedImage>, VerifyError> {
        if !self.has_ink {
            return Ok(None);
        }

        let mut buffer = Vec::new();
        DynamicImage::ImageLuma8(self.canvas.clone())
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .map_err(|e| VerifyError::Processing(format!("signature encode failed: {}", e)))?;

        Ok(Some(EncodedImage::new(
            buffer,
            ImageEncoding::Png,
            self.width,
            self.height,
        )))
    }

    /// Reset the surface to the baseline guide; emits nothing
    pub fn clear(&mut self) -> Option<EncodedImage> {
        self.canvas = GrayImage::from_pixel(self.width, self.height, PAPER);
        self.draw_guide();
        self.last_point = None;
        self.has_ink = false;
        log::debug!("Signature surface cleared");
        None
    }

    pub fn is_signed(&self) -> bool {
        self.has_ink
    }

    /// Horizontal guide line near the bottom of the surface
    fn draw_guide(&mut self) {
        if self.height < 8 {
            return;
        }
        let y = self.height - self.height / 5;
        for x in 4..self.width.saturating_sub(4) {
            self.canvas.put_pixel(x, y, GUIDE);
        }
    }

    fn plot(&mut self, x: f32, y: f32) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (x, y) = (x.round() as u32, y.round() as u32);
        if x < self.width && y < self.height {
            self.canvas.put_pixel(x, y, INK);
        }
    }

    /// Interpolated line segment between two pointer samples
    fn draw_segment(&mut self, x0: f32, y0: f32, x1: f32, y1: f32) {
        let dx = x1 - x0;
        let dy = y1 - y0;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.plot(x0 + dx * t, y0 + dy * t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untouched_surface_serializes_to_none() {
        let mut surface = SignatureCapture::new(320, 100);
        assert!(!surface.is_signed());
        assert!(surface.pointer_up().unwrap().is_none());
    }

    #[test]
    fn test_stroke_produces_png() {
        let mut surface = SignatureCapture::new(320, 100);
        surface.pointer_down(10.0, 50.0);
        surface.pointer_move(60.0, 40.0);
        surface.pointer_move(120.0, 55.0);

        let image = surface.pointer_up().unwrap().expect("signed bitmap");
        assert_eq!(image.encoding, ImageEncoding::Png);
        assert_eq!(image.width, 320);
        assert_eq!(image.height, 100);

        let decoded = image::load_from_memory(&image.bytes).unwrap();
        assert_eq!(decoded.to_luma8().dimensions(), (320, 100));
    }

    #[test]
    fn test_stroke_leaves_ink_on_canvas() {
        let mut surface = SignatureCapture::new(100, 100);
        surface.pointer_down(10.0, 10.0);
        surface.pointer_move(90.0, 90.0);
        let _ = surface.pointer_up().unwrap();

        let image = surface.serialize().unwrap().unwrap();
        let decoded = image::load_from_memory(&image.bytes).unwrap().to_luma8();
        let dark_pixels = decoded.pixels().filter(|p| p.0[0] < 100).count();
        assert!(dark_pixels >= 80, "expected a diagonal of ink, got {}", dark_pixels);
    }

    #[test]
    fn test_clear_resets_and_emits_none() {
        let mut surface = SignatureCapture::new(320, 100);
        surface.pointer_down(10.0, 50.0);
        surface.pointer_move(60.0, 40.0);
        let _ = surface.pointer_up().unwrap();

        assert!(surface.clear().is_none());
        assert!(!surface.is_signed());
        assert!(surface.serialize().unwrap().is_none());
    }

    #[test]
    fn test_move_without_down_is_ignored() {
        let mut surface = SignatureCapture::new(320, 100);
        surface.pointer_move(60.0, 40.0);
        assert!(!surface.is_signed());
        assert!(surface.pointer_up().unwrap().is_none());
    }

    #[test]
    fn test_out_of_bounds_points_are_clipped() {
        let mut surface = SignatureCapture::new(50, 50);
        surface.pointer_down(-5.0, 25.0);
        surface.pointer_move(80.0, 25.0);
        // Serialization still succeeds; nothing panicked
        assert!(surface.pointer_up().unwrap().is_some());
    }
}
