//! On-disk layout of a capture run
//!
//! ```text
//! <base>/<yyyyMMdd_HHmmss>/
//!     <prefix>_<run>_1.jpg
//!     <prefix>_<run>_2.jpg
//!     ...
//!     pano_thumbnail_<run>.jpg
//! ```

use crate::SessionConfig;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Run directory name format
pub const RUN_NAME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Preview mosaic filename prefix
pub const THUMBNAIL_PREFIX: &str = "pano_thumbnail_";

/// One captured frame on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureFrame {
    /// 1-based sequence index
    pub index: u32,
    /// Pan angle the frame was shot at
    pub pan: i32,
    /// Tilt angle the frame was shot at
    pub tilt: i32,
    /// Where the JPEG bytes were written
    pub path: PathBuf,
}

/// Paths of a single capture run
#[derive(Debug, Clone)]
pub struct RunLayout {
    run_name: String,
    dir: PathBuf,
    prefix: String,
    extension: String,
}

impl RunLayout {
    /// Layout for an explicit run name
    pub fn new(base: &Path, run_name: &str, prefix: &str, extension: &str) -> Self {
        Self {
            run_name: run_name.to_string(),
            dir: base.join(run_name),
            prefix: prefix.to_string(),
            extension: extension.to_string(),
        }
    }

    /// Layout for a run started at `time`
    pub fn at<Tz: TimeZone>(config: &SessionConfig, time: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let run_name = time.format(RUN_NAME_FORMAT).to_string();
        Self::new(&config.base_path, &run_name, &config.image_prefix, &config.extension)
    }

    /// Create the run directory
    pub fn create_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Filename of frame `index`
    pub fn frame_filename(&self, index: u32) -> String {
        format!("{}_{}_{}{}", self.prefix, self.run_name, index, self.extension)
    }

    pub fn frame_path(&self, index: u32) -> PathBuf {
        self.dir.join(self.frame_filename(index))
    }

    /// Where the preview mosaic is written at the end of the run
    pub fn thumbnail_path(&self) -> PathBuf {
        self.dir.join(format!("{}{}.jpg", THUMBNAIL_PREFIX, self.run_name))
    }
}

/// Extract the frame index from a filename of run `run_name`, if it is one
pub fn parse_frame_index(filename: &str, prefix: &str, run_name: &str, extension: &str) -> Option<u32> {
    filename
        .strip_prefix(prefix)?
        .strip_prefix('_')?
        .strip_prefix(run_name)?
        .strip_prefix('_')?
        .strip_suffix(extension)?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, Utc};

    #[test]
    fn test_names() {
        let time = Utc.with_ymd_and_hms(2011, 6, 2, 13, 32, 59).unwrap();
        let config = SessionConfig {
            base_path: PathBuf::from("/sdcard/pano"),
            ..SessionConfig::default()
        };
        let layout = RunLayout::at(&config, &time);

        assert_eq!(layout.run_name(), "20110602_133259");
        assert_eq!(layout.dir(), Path::new("/sdcard/pano/20110602_133259"));
        assert_eq!(layout.frame_filename(3), "pano_20110602_133259_3.jpg");
        assert_eq!(
            layout.thumbnail_path(),
            PathBuf::from("/sdcard/pano/20110602_133259/pano_thumbnail_20110602_133259.jpg")
        );
    }

    #[test]
    fn test_local_time_run_name_shape() {
        let layout = RunLayout::at(&SessionConfig::default(), &Local::now());
        assert_eq!(layout.run_name().len(), 15);
        assert_eq!(&layout.run_name()[8..9], "_");
    }

    #[test]
    fn test_parse_frame_index() {
        let run = "20110602_133259";
        assert_eq!(parse_frame_index("pano_20110602_133259_12.jpg", "pano", run, ".jpg"), Some(12));
        assert_eq!(parse_frame_index("pano_thumbnail_20110602_133259.jpg", "pano", run, ".jpg"), None);
        assert_eq!(parse_frame_index("pano_20110602_133259_1.png", "pano", run, ".jpg"), None);
        assert_eq!(parse_frame_index("img_20110602_133259_1.jpg", "pano", run, ".jpg"), None);
        assert_eq!(parse_frame_index("pano_20110602_133259_.jpg", "pano", run, ".jpg"), None);
        assert_eq!(parse_frame_index("pano_20110602_133259_x.jpg", "pano", run, ".jpg"), None);
    }
}
