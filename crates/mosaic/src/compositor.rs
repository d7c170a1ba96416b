//! Frame placement and blending

use crate::{MosaicConfig, MosaicError, ThumbnailCanvas};
use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use tracing::debug;

/// Canvas size for a full 360° sweep
pub fn canvas_size(config: &MosaicConfig) -> (u32, u32) {
    let width = (360.0 / config.fov_degrees * config.image_width as f32 * config.scale).round();
    let height = (config.image_height as f32 * config.scale).round();
    (width.max(1.0) as u32, height.max(1.0) as u32)
}

/// Left edge of the tile for a pan angle.
///
/// Increasing pan moves right to left across the canvas; pan 0 sits flush
/// with the right edge. Negative positions clamp to 0.
pub fn placement_x(canvas_width: u32, pan: i32, tile_span: f64) -> u32 {
    let x = (canvas_width as f64 * f64::from(360 - pan) / 360.0 - tile_span).round();
    if x < 0.0 {
        0
    } else {
        x as u32
    }
}

/// Decode a captured JPEG into a rotated preview tile
pub fn prepare_tile(jpeg: &[u8], config: &MosaicConfig) -> Result<RgbaImage, MosaicError> {
    let decoded = image::load_from_memory(jpeg).map_err(MosaicError::Decode)?;

    let sub = config.subsample.max(1);
    let subsampled = if sub > 1 {
        decoded.resize_exact(
            (decoded.width() / sub).max(1),
            (decoded.height() / sub).max(1),
            FilterType::Nearest,
        )
    } else {
        decoded
    };

    let tile = subsampled
        .resize_exact(config.tile_width, config.tile_height, FilterType::Triangle)
        .rotate90();
    Ok(tile.to_rgba8())
}

/// Result of blending one tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendOutcome {
    /// Region written, after clipping to the canvas
    Blended { width: u32, height: u32 },
    /// Clipped region was empty
    Skipped,
}

/// Blend `tile` into the canvas with its top-left corner at (x, y).
///
/// Unpainted canvas pixels take the tile pixel as is; painted ones become
/// the per-channel average. Either way the result is opaque. The region is
/// clipped to the canvas.
pub fn blend(canvas: &mut ThumbnailCanvas, tile: &RgbaImage, x: u32, y: u32) -> BlendOutcome {
    let region_width = tile.width().min(canvas.width().saturating_sub(x));
    let region_height = tile.height().min(canvas.height().saturating_sub(y));
    if region_width == 0 || region_height == 0 {
        debug!("Tile at ({}, {}) falls outside the canvas, skipping", x, y);
        return BlendOutcome::Skipped;
    }

    let pixels = canvas.pixels_mut();
    for ty in 0..region_height {
        for tx in 0..region_width {
            let src = tile.get_pixel(tx, ty);
            let dst = pixels.get_pixel_mut(x + tx, y + ty);
            *dst = if dst[3] == 0 {
                Rgba([src[0], src[1], src[2], 255])
            } else {
                Rgba([
                    ((u16::from(dst[0]) + u16::from(src[0])) / 2) as u8,
                    ((u16::from(dst[1]) + u16::from(src[1])) / 2) as u8,
                    ((u16::from(dst[2]) + u16::from(src[2])) / 2) as u8,
                    255,
                ])
            };
        }
    }

    BlendOutcome::Blended {
        width: region_width,
        height: region_height,
    }
}

/// Owns the preview canvas for one capture run
pub struct ThumbnailCompositor {
    config: MosaicConfig,
    canvas: ThumbnailCanvas,
    composites: usize,
}

impl ThumbnailCompositor {
    /// Allocate an unpainted canvas sized for the configuration
    pub fn new(config: MosaicConfig) -> Result<Self, MosaicError> {
        config.validate()?;
        let (width, height) = canvas_size(&config);
        debug!("Preview canvas {}x{}", width, height);
        Ok(Self {
            canvas: ThumbnailCanvas::new(width, height),
            config,
            composites: 0,
        })
    }

    /// Tile position for a pan angle (single row, so y is always 0)
    pub fn placement(&self, pan: i32) -> (u32, u32) {
        (placement_x(self.canvas.width(), pan, self.config.tile_span()), 0)
    }

    /// Decode a captured frame and blend it at the pan angle's column
    pub fn composite(&mut self, jpeg: &[u8], pan: i32) -> Result<BlendOutcome, MosaicError> {
        let (x, y) = self.placement(pan);
        self.composite_at(jpeg, x, y)
    }

    /// Decode a captured frame and blend it at an explicit position
    pub fn composite_at(&mut self, jpeg: &[u8], x: u32, y: u32) -> Result<BlendOutcome, MosaicError> {
        self.composites += 1;
        let tile = prepare_tile(jpeg, &self.config)?;
        let outcome = blend(&mut self.canvas, &tile, x, y);
        debug!("Pasted {}x{} tile at {}: {:?}", tile.width(), tile.height(), x, outcome);
        Ok(outcome)
    }

    /// Number of frames handed to the compositor
    pub fn composite_count(&self) -> usize {
        self.composites
    }

    pub fn canvas(&self) -> &ThumbnailCanvas {
        &self.canvas
    }

    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use image::{Rgb, RgbImage};
    use proptest::prelude::*;

    fn solid_tile(w: u32, h: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    fn jpeg(w: u32, h: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(w, h, Rgb([200, 100, 50]));
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, 90)
            .encode_image(&img)
            .unwrap();
        buf
    }

    #[test]
    fn test_default_canvas_size() {
        assert_eq!(canvas_size(&MosaicConfig::default()), (1646, 256));
    }

    #[test]
    fn test_placement_formula() {
        let (w, s) = (1646u32, 192.0);
        assert_eq!(placement_x(w, 0, s), 1454);
        assert_eq!(placement_x(w, 360, s), 0);
        assert_eq!(placement_x(w, 330, s), 0);
        assert_eq!(placement_x(w, 180, s), 631);
    }

    #[test]
    fn test_blend_onto_empty_copies_tile() {
        let mut canvas = ThumbnailCanvas::new(10, 10);
        let tile = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 7]));
        let outcome = blend(&mut canvas, &tile, 2, 3);

        assert_eq!(outcome, BlendOutcome::Blended { width: 4, height: 4 });
        assert_eq!(canvas.pixel(2, 3), Some(Rgba([10, 20, 30, 255])));
        assert_eq!(canvas.pixel(1, 3), Some(Rgba([0, 0, 0, 0])));
        assert_eq!(canvas.painted(), 16);
    }

    #[test]
    fn test_blend_averages_overlap() {
        let mut canvas = ThumbnailCanvas::new(10, 4);
        blend(&mut canvas, &solid_tile(6, 4, [100, 0, 255]), 0, 0);
        blend(&mut canvas, &solid_tile(6, 4, [51, 200, 0]), 4, 0);

        assert_eq!(canvas.pixel(3, 0), Some(Rgba([100, 0, 255, 255])));
        assert_eq!(canvas.pixel(4, 0), Some(Rgba([75, 100, 127, 255])));
        assert_eq!(canvas.pixel(9, 3), Some(Rgba([51, 200, 0, 255])));
    }

    #[test]
    fn test_blend_clips_right_and_bottom() {
        let mut canvas = ThumbnailCanvas::new(10, 5);
        let outcome = blend(&mut canvas, &solid_tile(6, 8, [1, 2, 3]), 7, 0);
        assert_eq!(outcome, BlendOutcome::Blended { width: 3, height: 5 });

        let outcome = blend(&mut canvas, &solid_tile(6, 8, [1, 2, 3]), 10, 0);
        assert_eq!(outcome, BlendOutcome::Skipped);
        let outcome = blend(&mut canvas, &solid_tile(6, 8, [1, 2, 3]), 0, 5);
        assert_eq!(outcome, BlendOutcome::Skipped);
    }

    #[test]
    fn test_prepare_tile_is_rotated() {
        let config = MosaicConfig::default();
        let tile = prepare_tile(&jpeg(640, 480), &config).unwrap();
        assert_eq!((tile.width(), tile.height()), (192, 256));
        assert_eq!(tile.get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn test_prepare_tile_rejects_garbage() {
        let err = prepare_tile(b"not a jpeg", &MosaicConfig::default()).unwrap_err();
        assert!(matches!(err, MosaicError::Decode(_)));
    }

    #[test]
    fn test_compositor_places_by_pan() {
        let config = MosaicConfig {
            image_width: 240,
            image_height: 320,
            scale: 0.8,
            subsample: 2,
            tile_width: 256,
            tile_height: 192,
            ..MosaicConfig::default()
        };
        let mut compositor = ThumbnailCompositor::new(config).unwrap();
        let w = compositor.canvas().width();

        let outcome = compositor.composite(&jpeg(320, 240), 0).unwrap();
        assert_eq!(outcome, BlendOutcome::Blended { width: 192, height: 256 });
        assert_eq!(compositor.placement(0).0, w - 192);
        assert_eq!(compositor.canvas().pixel(w - 1, 0).unwrap()[3], 255);
        assert_eq!(compositor.composite_count(), 1);
    }

    #[test]
    fn test_invalid_config() {
        let config = MosaicConfig {
            fov_degrees: 0.0,
            ..MosaicConfig::default()
        };
        assert!(ThumbnailCompositor::new(config).is_err());
    }

    proptest! {
        #[test]
        fn blending_identical_tile_keeps_rgb(r: u8, g: u8, b: u8, x in 0u32..12, y in 0u32..6) {
            let mut canvas = ThumbnailCanvas::new(12, 6);
            let tile = solid_tile(5, 3, [r, g, b]);
            blend(&mut canvas, &tile, x, y);
            let first = canvas.clone();
            blend(&mut canvas, &tile, x, y);
            prop_assert_eq!(first.as_image(), canvas.as_image());
        }

        #[test]
        fn placement_never_exceeds_canvas(w in 1u32..5000, pan in 0i32..360, span in 0.0f64..500.0) {
            prop_assert!(placement_x(w, pan, span) <= w);
        }
    }
}
