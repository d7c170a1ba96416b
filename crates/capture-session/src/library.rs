//! Past capture runs under the base directory

use crate::layout::{parse_frame_index, THUMBNAIL_PREFIX};
use crate::SessionConfig;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only view of the runs stored under a base directory
#[derive(Debug, Clone)]
pub struct PanoLibrary {
    base: PathBuf,
    prefix: String,
    extension: String,
    /// Filename suffix of a run's stitched result
    output_name: String,
}

impl PanoLibrary {
    pub fn new(base: &Path, prefix: &str, extension: &str, output_name: &str) -> Self {
        Self {
            base: base.to_path_buf(),
            prefix: prefix.to_string(),
            extension: extension.to_string(),
            output_name: output_name.to_string(),
        }
    }

    /// Library over the runs a session with `config` would write
    pub fn for_config(config: &SessionConfig, output_name: &str) -> Self {
        Self::new(&config.base_path, &config.image_prefix, &config.extension, output_name)
    }

    /// Run directories, oldest first. A missing base directory has no runs.
    pub fn runs(&self) -> io::Result<Vec<PathBuf>> {
        if !self.base.is_dir() {
            debug!("No run directory at {}", self.base.display());
            return Ok(Vec::new());
        }
        let mut runs = Vec::new();
        for entry in std::fs::read_dir(&self.base)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                runs.push(entry.path());
            }
        }
        runs.sort();
        debug!("{} runs under {}", runs.len(), self.base.display());
        Ok(runs)
    }

    /// Frames of a run, ordered by sequence index
    pub fn frames(&self, run_dir: &Path) -> io::Result<Vec<PathBuf>> {
        let run_name = run_name(run_dir);
        let mut frames: Vec<(u32, PathBuf)> = self
            .file_names(run_dir)?
            .into_iter()
            .filter_map(|(name, path)| {
                parse_frame_index(&name, &self.prefix, &run_name, &self.extension)
                    .map(|index| (index, path))
            })
            .collect();
        frames.sort_by_key(|(index, _)| *index);
        Ok(frames.into_iter().map(|(_, path)| path).collect())
    }

    /// The stitched result of a run, if one was produced
    pub fn result_image(&self, run_dir: &Path) -> io::Result<Option<PathBuf>> {
        Ok(self
            .file_names(run_dir)?
            .into_iter()
            .find(|(name, _)| name.ends_with(&self.output_name))
            .map(|(_, path)| path))
    }

    /// The preview mosaic of a run, if it was written
    pub fn thumbnail(&self, run_dir: &Path) -> io::Result<Option<PathBuf>> {
        Ok(self
            .file_names(run_dir)?
            .into_iter()
            .find(|(name, _)| name.starts_with(THUMBNAIL_PREFIX))
            .map(|(_, path)| path))
    }

    /// Where the stitched result of a run goes
    pub fn output_path(&self, run_dir: &Path) -> PathBuf {
        run_dir.join(&self.output_name)
    }

    fn file_names(&self, dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
            }
        }
        names.sort();
        Ok(names)
    }
}

fn run_name(run_dir: &Path) -> String {
    run_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
