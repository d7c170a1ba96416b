//! Pan/Tilt Capture Session
//!
//! Walks a pan/tilt grid, shooting one frame per position: move the head,
//! wait a fixed settle time, fire the camera, and block until the camera's
//! picture callback has saved the frame and blended it into the preview.

mod config;
mod grid;
mod layout;
mod library;
mod session;

pub use config::SessionConfig;
pub use grid::CaptureGrid;
pub use layout::{parse_frame_index, CaptureFrame, RunLayout};
pub use library::PanoLibrary;
pub use session::{PanTiltCaptureSession, SessionEvent, SessionReport, SessionState};

use camera_driver::CameraError;
use mosaic::MosaicError;
use thiserror::Error;

/// Capture session errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid capture grid: {0}")]
    InvalidGrid(String),

    #[error("Camera failure: {0}")]
    Camera(#[from] CameraError),

    #[error("Preview setup failed: {0}")]
    Mosaic(#[from] MosaicError),

    #[error("No picture callback for frame {index} within {waited_ms}ms")]
    CaptureTimeout { index: u32, waited_ms: u64 },
}
