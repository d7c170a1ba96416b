//! Layered settings: built-in defaults, then `pano.toml`, then `PANO_*`
//! environment variables (`__` separates nested keys, e.g.
//! `PANO_GRID__PAN_INCREMENT=45`).

use camera_driver::CameraConfig;
use capture_session::{CaptureGrid, SessionConfig};
use config::{Config, ConfigError, Environment, File};
use mosaic::MosaicConfig;
use pantilt_link::wire::DEFAULT_BAUD_RATE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use stitch_invoker::StitchParams;
use thiserror::Error;
use tracing::Level;

/// Default settings file, looked up in the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "pano.toml";

/// Settings errors
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] ConfigError),

    #[error("Unknown log level: {0}")]
    LogLevel(String),
}

/// Log line encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Everything the `pano` binary can be configured with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanoSettings {
    /// Serial device of the pan/tilt head
    pub serial_port: String,
    pub baud_rate: u32,
    /// Filename of the stitched result inside a run directory
    pub output_name: String,
    /// Stitcher executable used unless the native library is selected
    pub stitcher: String,
    /// Maximum log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    pub grid: CaptureGrid,
    pub session: SessionConfig,
    pub camera: CameraConfig,
    pub mosaic: MosaicConfig,
    pub stitch: StitchParams,
}

impl Default for PanoSettings {
    fn default() -> Self {
        Self {
            serial_port: "/dev/rfcomm0".to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            output_name: "result.jpg".to_string(),
            stitcher: "stitching_detailed".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            grid: CaptureGrid::default(),
            session: SessionConfig::default(),
            camera: CameraConfig::default(),
            mosaic: MosaicConfig::default(),
            stitch: StitchParams::default(),
        }
    }
}

impl PanoSettings {
    /// Load settings from `file` (or `pano.toml` if present) and the environment
    pub fn load(file: Option<&Path>) -> Result<Self, SettingsError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };

        let settings = Config::builder()
            .add_source(Config::try_from(&PanoSettings::default())?)
            .add_source(file_source)
            .add_source(
                Environment::with_prefix("PANO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Parsed `log_level`
    pub fn level(&self) -> Result<Level, SettingsError> {
        self.log_level
            .parse()
            .map_err(|_| SettingsError::LogLevel(self.log_level.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
serial_port = "/dev/ttyUSB1"
log_level = "debug"

[grid]
max_pan = 180
pan_increment = 45

[session]
base_path = "/tmp/panos"
capture_timeout_ms = 30000

[stitch]
warp_type = "cylindrical"
"#
        )
        .unwrap();

        let settings = PanoSettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.serial_port, "/dev/ttyUSB1");
        assert_eq!(settings.baud_rate, 9600);
        assert_eq!(settings.grid.pan_angles(), vec![0, 45, 90, 135]);
        assert_eq!(settings.grid.max_tilt, 1);
        assert_eq!(settings.session.base_path, Path::new("/tmp/panos"));
        assert_eq!(settings.session.capture_timeout_ms, Some(30000));
        assert_eq!(settings.session.thumbnail_quality, 60);
        assert_eq!(settings.stitch.warp_type, "cylindrical");
        assert_eq!(settings.stitch.match_conf, 0.3);
        assert_eq!(settings.level().unwrap(), Level::DEBUG);
        assert_eq!(settings.log_format, LogFormat::Text);
    }

    #[test]
    fn test_json_log_format() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "log_format = \"json\"").unwrap();
        let settings = PanoSettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_log_format_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "log_format = \"xml\"").unwrap();
        assert!(matches!(
            PanoSettings::load(Some(file.path())),
            Err(SettingsError::Load(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PanoSettings::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_bad_log_level() {
        let settings = PanoSettings {
            log_level: "loud".into(),
            ..PanoSettings::default()
        };
        assert!(matches!(settings.level(), Err(SettingsError::LogLevel(_))));
    }
}
