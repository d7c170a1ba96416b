//! Preview canvas

use crate::MosaicError;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::Path;
use tracing::info;

/// RGBA preview canvas.
///
/// Alpha doubles as a paint marker: 0 means no frame has touched the pixel
/// yet, 255 means it holds blended frame data.
#[derive(Debug, Clone)]
pub struct ThumbnailCanvas {
    pixels: RgbaImage,
}

impl ThumbnailCanvas {
    /// Create a fully transparent canvas
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0])),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Get pixel at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(*self.pixels.get_pixel(x, y))
    }

    /// Number of pixels painted so far
    pub fn painted(&self) -> usize {
        self.pixels.pixels().filter(|p| p[3] != 0).count()
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    /// Borrow the raw RGBA buffer
    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Encode as JPEG; alpha is dropped, unpainted areas come out black
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, MosaicError> {
        let rgb = DynamicImage::ImageRgba8(self.pixels.clone()).to_rgb8();
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality)
            .encode_image(&rgb)
            .map_err(MosaicError::Encode)?;
        Ok(buf)
    }

    /// Write the canvas as a JPEG file
    pub fn save_jpeg(&self, path: &Path, quality: u8) -> Result<(), MosaicError> {
        let jpeg = self.encode_jpeg(quality)?;
        std::fs::write(path, jpeg)?;
        info!("Preview written to {}", path.display());
        Ok(())
    }
}
