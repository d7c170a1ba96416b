//! Pan/Tilt Panorama Front End
//!
//! Wires the capture session, preview mosaic and stitcher together behind
//! the `pano` binary.

pub mod commands;
pub mod settings;

pub use settings::{LogFormat, PanoSettings, SettingsError};

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging(level: Level, format: LogFormat) -> anyhow::Result<()> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }
    Ok(())
}
