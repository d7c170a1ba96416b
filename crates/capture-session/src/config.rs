//! Capture session configuration

use camera_driver::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Capture session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory holding one subdirectory per run
    pub base_path: PathBuf,

    /// Frame filename prefix
    pub image_prefix: String,

    /// Frame filename extension, dot included
    pub extension: String,

    /// JPEG quality of the preview mosaic
    pub thumbnail_quality: u8,

    /// Settle time after each pan move within a row (milliseconds)
    pub pan_settle_ms: u64,

    /// Settle time after returning the pan axis to 0 (milliseconds)
    pub home_pan_settle_ms: u64,

    /// Settle time after a tilt move at the start of a row (milliseconds)
    pub tilt_settle_ms: u64,

    /// Settle time after the final tilt reset (milliseconds)
    pub home_tilt_settle_ms: u64,

    /// Give up on a picture callback after this long; `None` waits forever
    pub capture_timeout_ms: Option<u64>,

    /// Retry policy for busy camera rejections
    pub retry: RetryPolicy,

    /// Start the preview before moving the head so exposure can settle
    /// during the move
    pub preview_before_move: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("panoramas"),
            image_prefix: "pano".to_string(),
            extension: ".jpg".to_string(),
            thumbnail_quality: 60,
            pan_settle_ms: 1000,
            home_pan_settle_ms: 2000,
            tilt_settle_ms: 1000,
            home_tilt_settle_ms: 2000,
            capture_timeout_ms: None,
            retry: RetryPolicy::unbounded(),
            preview_before_move: false,
        }
    }
}

impl SessionConfig {
    pub fn pan_settle(&self) -> Duration {
        Duration::from_millis(self.pan_settle_ms)
    }

    pub fn home_pan_settle(&self) -> Duration {
        Duration::from_millis(self.home_pan_settle_ms)
    }

    pub fn tilt_settle(&self) -> Duration {
        Duration::from_millis(self.tilt_settle_ms)
    }

    pub fn home_tilt_settle(&self) -> Duration {
        Duration::from_millis(self.home_tilt_settle_ms)
    }

    pub fn capture_timeout(&self) -> Option<Duration> {
        self.capture_timeout_ms.map(Duration::from_millis)
    }

    /// Config with every settle delay set to zero
    pub fn without_settle(mut self) -> Self {
        self.pan_settle_ms = 0;
        self.home_pan_settle_ms = 0;
        self.tilt_settle_ms = 0;
        self.home_tilt_settle_ms = 0;
        self
    }
}
