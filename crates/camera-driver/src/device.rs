//! Hardware camera boundary

use crate::{CameraConfig, CameraError};
use std::sync::Arc;

/// Invoked by the device with the JPEG bytes of a finished picture.
///
/// Devices call it from their own thread, never from inside `take_picture`'s
/// caller context, and may reuse it across calls.
pub type PictureCallback = Arc<dyn Fn(Vec<u8>) + Send + Sync>;

/// A still camera with a preview stream and an asynchronous shutter
pub trait CameraDevice: Send {
    /// Acquire the device
    fn open(&mut self) -> Result<(), CameraError>;

    /// Apply picture size and quality
    fn configure(&mut self, config: &CameraConfig) -> Result<(), CameraError>;

    /// Start the preview stream. May be rejected with `Busy`.
    fn start_preview(&mut self) -> Result<(), CameraError>;

    /// Stop the preview stream
    fn stop_preview(&mut self);

    /// Fire the shutter. May be rejected with `Busy`; on success the
    /// callback runs later, once.
    fn take_picture(&mut self, on_taken: PictureCallback) -> Result<(), CameraError>;

    /// Give the device back to the system
    fn release(&mut self);
}
