//! Pan/tilt capture grid

use crate::SessionError;
use serde::{Deserialize, Serialize};

/// Angles visited by a capture run.
///
/// Each axis runs `0, inc, 2*inc, ...` while strictly below its max, so the
/// max itself is never visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureGrid {
    /// Pan sweep end, exclusive (degrees)
    pub max_pan: i32,
    /// Pan step (degrees)
    pub pan_increment: i32,
    /// Tilt sweep end, exclusive (degrees)
    pub max_tilt: i32,
    /// Tilt step (degrees)
    pub tilt_increment: i32,
}

impl Default for CaptureGrid {
    /// Single cylindrical row, 12 frames
    fn default() -> Self {
        Self {
            max_pan: 360,
            pan_increment: 30,
            max_tilt: 1,
            tilt_increment: 20,
        }
    }
}

impl CaptureGrid {
    /// Create a validated grid
    pub fn new(max_pan: i32, pan_increment: i32, max_tilt: i32, tilt_increment: i32) -> Result<Self, SessionError> {
        let grid = Self {
            max_pan,
            pan_increment,
            max_tilt,
            tilt_increment,
        };
        grid.validate()?;
        Ok(grid)
    }

    /// Check that both axes terminate and visit at least one angle
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.pan_increment <= 0 || self.tilt_increment <= 0 {
            return Err(SessionError::InvalidGrid(format!(
                "increments must be positive (pan {}, tilt {})",
                self.pan_increment, self.tilt_increment
            )));
        }
        if self.max_pan <= 0 || self.max_tilt <= 0 {
            return Err(SessionError::InvalidGrid(format!(
                "maxima must be positive (pan {}, tilt {})",
                self.max_pan, self.max_tilt
            )));
        }
        Ok(())
    }

    /// Pan angles of one row, in visiting order
    pub fn pan_angles(&self) -> Vec<i32> {
        axis(self.max_pan, self.pan_increment)
    }

    /// Tilt angles, in visiting order
    pub fn tilt_angles(&self) -> Vec<i32> {
        axis(self.max_tilt, self.tilt_increment)
    }

    /// All (pan, tilt) positions, tilt-major
    pub fn positions(&self) -> Vec<(i32, i32)> {
        let pans = self.pan_angles();
        self.tilt_angles()
            .into_iter()
            .flat_map(|tilt| pans.iter().map(move |&pan| (pan, tilt)))
            .collect()
    }

    /// Number of frames a run will capture
    pub fn frame_count(&self) -> usize {
        self.pan_angles().len() * self.tilt_angles().len()
    }
}

fn axis(max: i32, increment: i32) -> Vec<i32> {
    if increment <= 0 {
        return Vec::new();
    }
    (0..max).step_by(increment as usize).collect()
}
