//! Simulated camera producing synthetic JPEG frames

use crate::device::{CameraDevice, PictureCallback};
use crate::{CameraConfig, CameraError};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// A camera that renders a gradient per shot on its own thread.
///
/// Each shot is shifted in hue by the shot number so consecutive frames are
/// distinguishable in the mosaic.
pub struct SimulatedCamera {
    config: CameraConfig,
    /// Delay between shutter and callback
    exposure: Duration,
    /// `Busy` rejections returned before each successful preview/shutter call
    busy_rejections: u32,
    remaining_preview_busy: u32,
    remaining_shutter_busy: u32,
    fail_open: bool,
    opened: bool,
    previewing: bool,
    shots: Arc<AtomicU32>,
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCamera {
    /// Create a simulated camera with a 50ms exposure
    pub fn new() -> Self {
        Self {
            config: CameraConfig::default(),
            exposure: Duration::from_millis(50),
            busy_rejections: 0,
            remaining_preview_busy: 0,
            remaining_shutter_busy: 0,
            fail_open: false,
            opened: false,
            previewing: false,
            shots: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Set the delay before the picture callback fires
    pub fn with_exposure(mut self, exposure: Duration) -> Self {
        self.exposure = exposure;
        self
    }

    /// Reject every preview start and shutter press `n` times first
    pub fn with_busy_rejections(mut self, n: u32) -> Self {
        self.busy_rejections = n;
        self.remaining_preview_busy = n;
        self.remaining_shutter_busy = n;
        self
    }

    /// Make `open` fail
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Shared counter of delivered pictures
    pub fn shot_counter(&self) -> Arc<AtomicU32> {
        self.shots.clone()
    }

    /// Render one synthetic frame as JPEG bytes
    pub fn render_frame(config: &CameraConfig, shot: u32) -> Result<Vec<u8>, CameraError> {
        let shift = (shot.wrapping_mul(47) % 256) as u8;
        let (w, h) = (config.width.max(1), config.height.max(1));
        let img = RgbImage::from_fn(w, h, |x, y| {
            Rgb([
                ((x * 255 / w) as u8).wrapping_add(shift),
                (y * 255 / h) as u8,
                shift,
            ])
        });

        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, config.jpeg_quality)
            .encode_image(&img)
            .map_err(|e| CameraError::Device(e.to_string()))?;
        Ok(buf)
    }
}

impl CameraDevice for SimulatedCamera {
    fn open(&mut self) -> Result<(), CameraError> {
        if self.fail_open {
            return Err(CameraError::Open("simulated camera unavailable".into()));
        }
        self.opened = true;
        Ok(())
    }

    fn configure(&mut self, config: &CameraConfig) -> Result<(), CameraError> {
        if config.width == 0 || config.height == 0 {
            return Err(CameraError::Configure(format!(
                "invalid picture size {}x{}",
                config.width, config.height
            )));
        }
        self.config = config.clone();
        Ok(())
    }

    fn start_preview(&mut self) -> Result<(), CameraError> {
        if !self.opened {
            return Err(CameraError::Device("camera not open".into()));
        }
        if self.remaining_preview_busy > 0 {
            self.remaining_preview_busy -= 1;
            return Err(CameraError::Busy("preview not ready".into()));
        }
        self.remaining_preview_busy = self.busy_rejections;
        self.previewing = true;
        Ok(())
    }

    fn stop_preview(&mut self) {
        self.previewing = false;
    }

    fn take_picture(&mut self, on_taken: PictureCallback) -> Result<(), CameraError> {
        if !self.previewing {
            return Err(CameraError::Device("take_picture without preview".into()));
        }
        if self.remaining_shutter_busy > 0 {
            self.remaining_shutter_busy -= 1;
            return Err(CameraError::Busy("shutter not ready".into()));
        }
        self.remaining_shutter_busy = self.busy_rejections;

        let shot = self.shots.load(Ordering::SeqCst) + 1;
        let config = self.config.clone();
        let exposure = self.exposure;
        let shots = self.shots.clone();
        debug!("Simulated shutter, shot {}", shot);

        std::thread::spawn(move || {
            std::thread::sleep(exposure);
            match SimulatedCamera::render_frame(&config, shot) {
                Ok(jpeg) => {
                    shots.fetch_add(1, Ordering::SeqCst);
                    on_taken(jpeg);
                }
                Err(e) => error!("Simulated frame render failed: {}", e),
            }
        });
        Ok(())
    }

    fn release(&mut self) {
        self.previewing = false;
        self.opened = false;
    }
}
