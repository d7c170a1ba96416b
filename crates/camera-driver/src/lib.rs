//! Still Camera Driver
//!
//! Adapter around a callback-driven still camera:
//! - `CameraDevice`: the hardware boundary (open, preview, take picture)
//! - `CameraDriver`: retries transient "device busy" rejections
//! - `CaptureHandshake`: wakes the capture loop when a picture arrives
//! - `SimulatedCamera`: synthetic frames for dry runs and tests

pub mod device;
pub mod driver;
pub mod handshake;
pub mod simulated;

pub use device::{CameraDevice, PictureCallback};
pub use driver::{retry_until_success, CameraDriver, DriverStats, RetryPolicy};
pub use handshake::{CaptureHandshake, HandshakeState};
pub use simulated::SimulatedCamera;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera busy: {0}")]
    Busy(String),

    #[error("Failed to open camera: {0}")]
    Open(String),

    #[error("Failed to configure camera: {0}")]
    Configure(String),

    #[error("Camera device error: {0}")]
    Device(String),

    #[error("Camera still busy after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

impl CameraError {
    /// Whether trying the same call again can succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, CameraError::Busy(_))
    }
}

/// Still capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Picture width in pixels
    pub width: u32,
    /// Picture height in pixels
    pub height: u32,
    /// JPEG quality of delivered pictures
    pub jpeg_quality: u8,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 2560,
            height: 1920,
            jpeg_quality: 90,
        }
    }
}
