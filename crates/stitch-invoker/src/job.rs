//! Stitch job description and argument packaging

use crate::StitchError;
use capture_session::parse_frame_index;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Program name placed in `argv[0]`
pub const PROGRAM_NAME: &str = "Stitch";

/// Fixed stitcher options
const WORK_MEGAPIX: &str = "0.2";
const SEAM_MEGAPIX: &str = "0.2";
const EXPOSURE_COMPENSATOR: &str = "gain";

/// Tunable stitcher parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchParams {
    /// Warp surface (e.g. "spherical", "cylindrical", "plane")
    pub warp_type: String,
    /// Confidence for feature matching
    pub match_conf: f32,
    /// Threshold for two images being from the same panorama
    pub conf_thresh: f32,
}

impl Default for StitchParams {
    fn default() -> Self {
        Self {
            warp_type: "spherical".to_string(),
            match_conf: 0.3,
            conf_thresh: 1.0,
        }
    }
}

/// Frames to stitch and where to put the result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchJob {
    frames: Vec<PathBuf>,
    output: PathBuf,
}

impl StitchJob {
    /// Stitch `frames`, in the given order, into `output`
    pub fn new(frames: Vec<PathBuf>, output: PathBuf) -> Self {
        Self { frames, output }
    }

    /// Job over every frame of a capture run, ordered by frame index.
    /// The output is written into the run directory as `output_name`.
    pub fn from_run_dir(
        run_dir: &Path,
        prefix: &str,
        extension: &str,
        output_name: &str,
    ) -> Result<Self, StitchError> {
        let run_name = run_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut frames = Vec::new();
        for entry in std::fs::read_dir(run_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(index) = parse_frame_index(&name, prefix, &run_name, extension) {
                frames.push((index, entry.path()));
            }
        }
        frames.sort_by_key(|(index, _)| *index);
        debug!("Found {} frames in {}", frames.len(), run_dir.display());

        Ok(Self::new(
            frames.into_iter().map(|(_, path)| path).collect(),
            run_dir.join(output_name),
        ))
    }

    pub fn frames(&self) -> &[PathBuf] {
        &self.frames
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Command-line style argument vector, program name first
    pub fn args(&self, params: &StitchParams) -> Vec<String> {
        let mut args = Vec::with_capacity(self.frames.len() + 16);
        args.push(PROGRAM_NAME.to_string());
        args.extend(self.frames.iter().map(|p| p.to_string_lossy().into_owned()));
        for (flag, value) in [
            ("--warp", params.warp_type.clone()),
            ("--conf_thresh", params.conf_thresh.to_string()),
            ("--match_conf", params.match_conf.to_string()),
            ("--work_megapix", WORK_MEGAPIX.to_string()),
            ("--seam_megapix", SEAM_MEGAPIX.to_string()),
            ("--expos_comp", EXPOSURE_COMPENSATOR.to_string()),
            ("--output", self.output.to_string_lossy().into_owned()),
        ] {
            args.push(flag.to_string());
            args.push(value);
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_layout() {
        let job = StitchJob::new(
            vec![PathBuf::from("/r/a_1.jpg"), PathBuf::from("/r/a_2.jpg")],
            PathBuf::from("/r/result.jpg"),
        );
        assert_eq!(
            job.args(&StitchParams::default()),
            vec![
                "Stitch",
                "/r/a_1.jpg",
                "/r/a_2.jpg",
                "--warp",
                "spherical",
                "--conf_thresh",
                "1",
                "--match_conf",
                "0.3",
                "--work_megapix",
                "0.2",
                "--seam_megapix",
                "0.2",
                "--expos_comp",
                "gain",
                "--output",
                "/r/result.jpg",
            ]
        );
    }

    #[test]
    fn test_params_flow_into_args() {
        let job = StitchJob::new(vec![], PathBuf::from("out.jpg"));
        let params = StitchParams {
            warp_type: "cylindrical".into(),
            match_conf: 0.65,
            conf_thresh: 0.8,
        };
        let args = job.args(&params);
        assert_eq!(&args[1..3], ["--warp", "cylindrical"]);
        assert_eq!(&args[3..7], ["--conf_thresh", "0.8", "--match_conf", "0.65"]);
    }

    #[test]
    fn test_from_run_dir_orders_by_index() {
        let base = tempfile::tempdir().unwrap();
        let run = base.path().join("20240101_120000");
        std::fs::create_dir_all(&run).unwrap();
        for name in [
            "pano_20240101_120000_10.jpg",
            "pano_20240101_120000_2.jpg",
            "pano_20240101_120000_1.jpg",
            "pano_thumbnail_20240101_120000.jpg",
            "result.jpg",
        ] {
            std::fs::write(run.join(name), b"x").unwrap();
        }

        let job = StitchJob::from_run_dir(&run, "pano", ".jpg", "result.jpg").unwrap();
        let names: Vec<_> = job
            .frames()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "pano_20240101_120000_1.jpg",
                "pano_20240101_120000_2.jpg",
                "pano_20240101_120000_10.jpg"
            ]
        );
        assert_eq!(job.output(), run.join("result.jpg"));
    }
}
