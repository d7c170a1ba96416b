//! `pano` subcommands

use crate::PanoSettings;
use anyhow::{bail, Context};
use camera_driver::{CameraDriver, SimulatedCamera};
use capture_session::{PanTiltCaptureSession, PanoLibrary, SessionEvent, SessionReport};
use pantilt_link::MotionLink;
use serde::Serialize;
use std::path::PathBuf;
use stitch_invoker::{
    CommandStitcher, NativeStitcher, StitchJob, StitchJobInvoker, StitchOutcome, Stitcher,
};
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Capture one panorama.
///
/// With `dry_run` no serial port is opened and motion commands are
/// discarded. Frames always come from the simulated camera.
pub async fn capture(
    settings: &PanoSettings,
    port: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<SessionReport> {
    if dry_run {
        info!("Dry run: motion commands are discarded");
        return run_session(settings, MotionLink::new(tokio::io::sink())).await;
    }

    let port = port.unwrap_or(settings.serial_port.as_str());
    let link = MotionLink::open_serial(port, settings.baud_rate)
        .with_context(|| format!("opening pan/tilt head on {}", port))?;
    run_session(settings, link).await
}

async fn run_session<W: AsyncWrite + Unpin + Send>(
    settings: &PanoSettings,
    link: MotionLink<W>,
) -> anyhow::Result<SessionReport> {
    let camera = CameraDriver::new(
        SimulatedCamera::new(),
        settings.camera.clone(),
        settings.session.retry,
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = PanTiltCaptureSession::new(
        settings.grid,
        settings.session.clone(),
        settings.mosaic.clone(),
        link,
        camera,
    )
    .with_events(tx);

    let listener = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                SessionEvent::FrameCaptured { index, pan, tilt } => {
                    info!("Captured frame {} at {}/{}", index, pan, tilt)
                }
                SessionEvent::Failed(reason) => warn!("Capture aborted: {}", reason),
                SessionEvent::Progress(_) | SessionEvent::Finished(_) => {}
            }
        }
    });

    let report = session.run().await.context("capture session failed")?;
    let _ = listener.await;
    Ok(report)
}

/// One line of `pano list`
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub name: String,
    pub frames: usize,
    pub thumbnail: Option<PathBuf>,
    pub result: Option<PathBuf>,
}

/// Summaries of every stored run, oldest first
pub fn list(settings: &PanoSettings) -> anyhow::Result<Vec<RunSummary>> {
    let library = PanoLibrary::for_config(&settings.session, &settings.output_name);
    let mut summaries = Vec::new();
    for run in library.runs()? {
        summaries.push(RunSummary {
            name: run
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            frames: library.frames(&run)?.len(),
            thumbnail: library.thumbnail(&run)?,
            result: library.result_image(&run)?,
        });
    }
    Ok(summaries)
}

/// Stitch a run (the most recent one if `run` is `None`) and return the
/// path of the result
pub async fn stitch(
    settings: &PanoSettings,
    run: Option<&str>,
    native: bool,
) -> anyhow::Result<PathBuf> {
    let run_dir = match run {
        Some(name) => settings.session.base_path.join(name),
        None => {
            let library = PanoLibrary::for_config(&settings.session, &settings.output_name);
            match library.runs()?.pop() {
                Some(latest) => latest,
                None => bail!("no runs under {}", settings.session.base_path.display()),
            }
        }
    };

    let job = StitchJob::from_run_dir(
        &run_dir,
        &settings.session.image_prefix,
        &settings.session.extension,
        &settings.output_name,
    )
    .with_context(|| format!("reading {}", run_dir.display()))?;

    let outcome = if native {
        invoke(NativeStitcher, &job, settings).await?
    } else {
        invoke(CommandStitcher::new(&settings.stitcher), &job, settings).await?
    };

    match outcome {
        StitchOutcome::Success => Ok(job.output().to_path_buf()),
        StitchOutcome::Failed(status) => bail!("stitcher failed with status {}", status),
    }
}

async fn invoke<S: Stitcher + 'static>(
    stitcher: S,
    job: &StitchJob,
    settings: &PanoSettings,
) -> anyhow::Result<StitchOutcome> {
    Ok(StitchJobInvoker::new(stitcher).run(job, &settings.stitch).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camera_driver::CameraConfig;
    use capture_session::{CaptureGrid, SessionState};
    use mosaic::MosaicConfig;

    fn settings_in(base: &std::path::Path) -> PanoSettings {
        let mut settings = PanoSettings::default();
        settings.session.base_path = base.to_path_buf();
        settings.grid = CaptureGrid::new(72, 36, 1, 45).unwrap();
        settings.camera = CameraConfig {
            width: 64,
            height: 48,
            jpeg_quality: 80,
        };
        settings.mosaic = MosaicConfig {
            image_width: 48,
            image_height: 64,
            scale: 0.5,
            subsample: 2,
            tile_width: 16,
            tile_height: 12,
            ..MosaicConfig::default()
        };
        settings
    }

    #[tokio::test(start_paused = true)]
    async fn test_dry_run_capture_then_list() {
        let base = tempfile::tempdir().unwrap();
        let settings = settings_in(base.path());

        let report = capture(&settings, None, true).await.unwrap();
        assert_eq!(report.state, SessionState::Completed);
        assert_eq!(report.frames.len(), 2);

        let runs = list(&settings).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].name, report.run_name);
        assert_eq!(runs[0].frames, 2);
        assert!(runs[0].thumbnail.is_some());
        assert_eq!(runs[0].result, None);
    }

    #[tokio::test]
    async fn test_stitch_without_runs() {
        let base = tempfile::tempdir().unwrap();
        let err = stitch(&settings_in(base.path()), None, false).await.unwrap_err();
        assert!(err.to_string().contains("no runs"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stitch_latest_run() {
        let base = tempfile::tempdir().unwrap();
        let run = base.path().join("20240101_120000");
        std::fs::create_dir_all(&run).unwrap();
        std::fs::write(run.join("pano_20240101_120000_1.jpg"), b"x").unwrap();

        let mut settings = settings_in(base.path());
        settings.stitcher = "true".into();
        let output = stitch(&settings, None, false).await.unwrap();
        assert_eq!(output, run.join("result.jpg"));

        settings.stitcher = "false".into();
        assert!(stitch(&settings, Some("20240101_120000"), false).await.is_err());
    }
}
