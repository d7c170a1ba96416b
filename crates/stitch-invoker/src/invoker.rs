//! Background stitch invocation

use crate::{StitchError, StitchJob, StitchParams, Stitcher};
use std::sync::Arc;
use tracing::{info, warn};

/// Interpreted stitcher status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StitchOutcome {
    Success,
    /// Non-zero status from the stitcher
    Failed(i32),
}

impl From<i32> for StitchOutcome {
    fn from(status: i32) -> Self {
        if status == 0 {
            Self::Success
        } else {
            Self::Failed(status)
        }
    }
}

impl StitchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Runs stitch jobs on the blocking thread pool
pub struct StitchJobInvoker<S> {
    stitcher: Arc<S>,
}

impl<S> Clone for StitchJobInvoker<S> {
    fn clone(&self) -> Self {
        Self {
            stitcher: self.stitcher.clone(),
        }
    }
}

impl<S: Stitcher + 'static> StitchJobInvoker<S> {
    pub fn new(stitcher: S) -> Self {
        Self {
            stitcher: Arc::new(stitcher),
        }
    }

    /// Stitch `job` and wait for the stitcher's status
    pub async fn run(&self, job: &StitchJob, params: &StitchParams) -> Result<StitchOutcome, StitchError> {
        if job.frames().is_empty() {
            return Err(StitchError::NoFrames);
        }

        let args = job.args(params);
        info!(
            "Stitching {} frames into {}",
            job.frames().len(),
            job.output().display()
        );

        let stitcher = self.stitcher.clone();
        let status = tokio::task::spawn_blocking(move || stitcher.stitch(&args))
            .await
            .map_err(|e| StitchError::Join(e.to_string()))?;

        let outcome = StitchOutcome::from(status);
        match outcome {
            StitchOutcome::Success => info!("Stitch finished: {}", job.output().display()),
            StitchOutcome::Failed(code) => warn!("Stitcher exited with status {}", code),
        }
        Ok(outcome)
    }
}
