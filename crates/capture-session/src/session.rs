//! Capture session state machine
//!
//! One session walks the grid once: for each tilt row the head is homed on
//! pan and tilted, then for each pan angle the head moves, the camera fires,
//! and the loop blocks until the picture callback has stored the frame.
//! Motion completion is approximated with fixed settle delays; the head never
//! acknowledges a move.

use crate::layout::{CaptureFrame, RunLayout};
use crate::{CaptureGrid, SessionConfig, SessionError};
use camera_driver::{CameraDevice, CameraDriver, CaptureHandshake, PictureCallback};
use mosaic::{MosaicConfig, ThumbnailCompositor};
use pantilt_link::{MotionCommand, MotionLink};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    NotStarted,
    Running,
    Completed,
    Failed,
}

/// Notifications sent to the session's caller
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Human-readable status line
    Progress(String),
    /// A picture callback was handled and the loop advanced
    FrameCaptured { index: u32, pan: i32, tilt: i32 },
    /// The run completed
    Finished(SessionReport),
    /// The run stopped early
    Failed(String),
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub run_name: String,
    pub run_dir: PathBuf,
    /// Frames written, by index
    pub frames: Vec<CaptureFrame>,
    /// Preview mosaic, if it could be written
    pub thumbnail: Option<PathBuf>,
    /// Frames handed to the compositor
    pub composites: usize,
    pub state: SessionState,
}

/// Storage shared with the picture callback
struct FrameSink {
    layout: RunLayout,
    compositor: Mutex<ThumbnailCompositor>,
    frames: Mutex<Vec<CaptureFrame>>,
}

impl FrameSink {
    /// Persist one frame and blend it into the preview. Failures are logged.
    fn store(&self, index: u32, pan: i32, tilt: i32, jpeg: &[u8]) {
        let path = self.layout.frame_path(index);
        match std::fs::write(&path, jpeg) {
            Ok(()) => {
                debug!("Wrote frame {} ({} bytes) to {}", index, jpeg.len(), path.display());
                lock(&self.frames).push(CaptureFrame {
                    index,
                    pan,
                    tilt,
                    path,
                });
            }
            Err(e) => warn!("Failed to write frame {} to {}: {}", index, path.display(), e),
        }

        if let Err(e) = lock(&self.compositor).composite(jpeg, pan) {
            warn!("Frame {} left out of the preview: {}", index, e);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Drives the head and the camera over a capture grid
pub struct PanTiltCaptureSession<W, C: CameraDevice> {
    grid: CaptureGrid,
    config: SessionConfig,
    mosaic: MosaicConfig,
    link: MotionLink<W>,
    camera: CameraDriver<C>,
    events: Option<UnboundedSender<SessionEvent>>,
    state: SessionState,
}

impl<W, C> PanTiltCaptureSession<W, C>
where
    W: AsyncWrite + Unpin + Send,
    C: CameraDevice,
{
    /// Create a session owning the link and camera for its whole run
    pub fn new(
        grid: CaptureGrid,
        config: SessionConfig,
        mosaic: MosaicConfig,
        link: MotionLink<W>,
        camera: CameraDriver<C>,
    ) -> Self {
        Self {
            grid,
            config,
            mosaic,
            link,
            camera,
            events: None,
            state: SessionState::NotStarted,
        }
    }

    /// Send progress and completion events to `tx`
    pub fn with_events(mut self, tx: UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the capture to completion.
    ///
    /// Without a configured capture timeout this waits forever on a camera
    /// that never delivers its picture.
    pub async fn run(mut self) -> Result<SessionReport, SessionError> {
        self.state = SessionState::Running;
        match self.capture().await {
            Ok(report) => {
                self.emit(SessionEvent::Finished(report.clone()));
                Ok(report)
            }
            Err(e) => {
                error!("Capture session failed: {}", e);
                self.state = SessionState::Failed;
                self.camera.release();
                self.emit(SessionEvent::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn capture(&mut self) -> Result<SessionReport, SessionError> {
        self.grid.validate()?;

        let layout = RunLayout::at(&self.config, &chrono::Local::now());
        if let Err(e) = layout.create_dir() {
            warn!("Failed to create run directory {}: {}", layout.dir().display(), e);
        }
        info!(
            "Starting capture run {} ({} frames) in {}",
            layout.run_name(),
            self.grid.frame_count(),
            layout.dir().display()
        );

        let sink = Arc::new(FrameSink {
            compositor: Mutex::new(ThumbnailCompositor::new(self.mosaic.clone())?),
            layout,
            frames: Mutex::new(Vec::with_capacity(self.grid.frame_count())),
        });
        let handshake = Arc::new(CaptureHandshake::new());

        self.camera.open()?;

        let pans = self.grid.pan_angles();
        let mut index = 0u32;
        for tilt in self.grid.tilt_angles() {
            self.progress("Moving pan/tilt head");
            self.move_head(MotionCommand::Pan(0), self.config.home_pan_settle()).await;
            self.move_head(MotionCommand::Tilt(tilt), self.config.tilt_settle()).await;
            self.move_head(MotionCommand::Settle(None), Duration::ZERO).await;

            for &pan in &pans {
                index += 1;
                self.progress(&format!("Moving to {}/{} degrees", pan, tilt));
                self.shoot(&sink, &handshake, index, pan, tilt).await?;
                self.emit(SessionEvent::FrameCaptured { index, pan, tilt });
            }
        }

        self.progress("Resetting to initial position");
        self.move_head(MotionCommand::Pan(0), self.config.home_pan_settle()).await;
        self.move_head(MotionCommand::Tilt(0), self.config.home_tilt_settle()).await;
        self.move_head(MotionCommand::Settle(None), Duration::ZERO).await;

        let thumbnail = self.write_thumbnail(&sink);
        self.camera.release();
        self.state = SessionState::Completed;
        self.progress("Panorama successfully completed");

        let mut frames = lock(&sink.frames).clone();
        frames.sort_by_key(|f| f.index);
        let composites = lock(&sink.compositor).composite_count();
        Ok(SessionReport {
            run_name: sink.layout.run_name().to_string(),
            run_dir: sink.layout.dir().to_path_buf(),
            frames,
            thumbnail,
            composites,
            state: self.state,
        })
    }

    /// Move to `pan`, fire the camera and wait for the picture callback
    async fn shoot(
        &mut self,
        sink: &Arc<FrameSink>,
        handshake: &Arc<CaptureHandshake>,
        index: u32,
        pan: i32,
        tilt: i32,
    ) -> Result<(), SessionError> {
        if self.config.preview_before_move {
            self.camera.start_preview().await?;
            self.move_to_pan(pan).await;
        } else {
            self.move_to_pan(pan).await;
            self.camera.start_preview().await?;
        }

        let on_taken: PictureCallback = {
            let sink = sink.clone();
            let handshake = handshake.clone();
            Arc::new(move |jpeg: Vec<u8>| {
                sink.store(index, pan, tilt, &jpeg);
                handshake.signal();
            })
        };
        self.camera.trigger_capture(on_taken).await?;

        match self.config.capture_timeout() {
            Some(timeout) => {
                if !handshake.wait_timeout(timeout).await {
                    return Err(SessionError::CaptureTimeout {
                        index,
                        waited_ms: timeout.as_millis() as u64,
                    });
                }
            }
            None => handshake.wait().await,
        }
        debug!("Picture {} taken at {}/{}", index, pan, tilt);

        self.camera.stop_preview();
        Ok(())
    }

    async fn move_to_pan(&mut self, pan: i32) {
        self.move_head(MotionCommand::Pan(pan), self.config.pan_settle()).await;
        self.move_head(MotionCommand::Settle(Some(pan)), Duration::ZERO).await;
    }

    /// Send a command, then give the head `settle` to get there
    async fn move_head(&mut self, command: MotionCommand, settle: Duration) {
        if let Err(e) = self.link.send(&command).await {
            warn!("Motion command {:?} not delivered: {}", command, e);
        }
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }
    }

    fn write_thumbnail(&self, sink: &FrameSink) -> Option<PathBuf> {
        let path = sink.layout.thumbnail_path();
        let compositor = lock(&sink.compositor);
        match compositor
            .canvas()
            .save_jpeg(&path, self.config.thumbnail_quality)
        {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("Failed to write preview mosaic {}: {}", path.display(), e);
                None
            }
        }
    }

    fn progress(&self, message: &str) {
        info!("{}", message);
        self.emit(SessionEvent::Progress(message.to_string()));
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
