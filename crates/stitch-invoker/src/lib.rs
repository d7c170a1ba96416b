//! Panorama Stitch Invoker
//!
//! The full-resolution stitch is done by an external stitcher driven like a
//! command line: an argument vector in, an integer status out (0 = success).
//! This crate builds that argument vector from a run's frames and runs the
//! stitcher off the async runtime.

pub mod backend;
pub mod invoker;
pub mod job;

pub use backend::{CommandStitcher, NativeStitcher, Stitcher};
pub use invoker::{StitchJobInvoker, StitchOutcome};
pub use job::{StitchJob, StitchParams};

use thiserror::Error;

/// Stitch error types
#[derive(Error, Debug)]
pub enum StitchError {
    #[error("No frames to stitch")]
    NoFrames,

    #[error("Failed to read run directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stitcher task panicked: {0}")]
    Join(String),
}
