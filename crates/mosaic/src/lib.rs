//! Panorama Preview Mosaic
//!
//! Keeps a small RGBA canvas covering 360° of pan and blends every captured
//! frame into it at the column matching its pan angle. Overlapping regions
//! are averaged; nothing is feature-aligned, so ghosting at seams is normal.

pub mod canvas;
pub mod compositor;

pub use canvas::ThumbnailCanvas;
pub use compositor::{blend, canvas_size, placement_x, prepare_tile, BlendOutcome, ThumbnailCompositor};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mosaic error types
#[derive(Error, Debug)]
pub enum MosaicError {
    #[error("Failed to decode frame: {0}")]
    Decode(image::ImageError),

    #[error("Failed to encode preview: {0}")]
    Encode(image::ImageError),

    #[error("Preview I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid mosaic configuration: {0}")]
    Config(String),
}

/// Mosaic geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MosaicConfig {
    /// Horizontal field of view of one frame (degrees)
    pub fov_degrees: f32,
    /// Frame width after the orientation fix (pixels)
    pub image_width: u32,
    /// Frame height after the orientation fix (pixels)
    pub image_height: u32,
    /// Canvas pixels per frame pixel
    pub scale: f32,
    /// Decode-time subsampling factor
    pub subsample: u32,
    /// Tile width before rotation
    pub tile_width: u32,
    /// Tile height before rotation
    pub tile_height: u32,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 42.0,
            image_width: 1920,
            image_height: 2560,
            scale: 0.1,
            subsample: 10,
            tile_width: 256,
            tile_height: 192,
        }
    }
}

impl MosaicConfig {
    /// Check that the geometry yields a non-empty canvas
    pub fn validate(&self) -> Result<(), MosaicError> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees <= 360.0) {
            return Err(MosaicError::Config(format!(
                "field of view {} out of (0, 360]",
                self.fov_degrees
            )));
        }
        if !(self.scale > 0.0) {
            return Err(MosaicError::Config(format!("scale {} must be positive", self.scale)));
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(MosaicError::Config("image size must be non-zero".into()));
        }
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(MosaicError::Config("tile size must be non-zero".into()));
        }
        Ok(())
    }

    /// Width one frame occupies on the canvas
    pub fn tile_span(&self) -> f64 {
        self.image_width as f64 * self.scale as f64
    }
}
