//! Pan/Tilt Panorama - Main Entry Point

use clap::{Parser, Subcommand};
use pano_cli::{commands, init_logging, PanoSettings};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "pano")]
#[command(about = "Capture and stitch panoramas with a pan/tilt head")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to ./pano.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the capture grid and store one run
    Capture {
        /// Serial device of the pan/tilt head
        #[arg(long)]
        port: Option<String>,

        /// Discard motion commands instead of opening the serial port
        #[arg(long)]
        dry_run: bool,

        /// Pan sweep end, exclusive (degrees)
        #[arg(long)]
        max_pan: Option<i32>,

        /// Pan step (degrees)
        #[arg(long)]
        pan_increment: Option<i32>,

        /// Tilt sweep end, exclusive (degrees)
        #[arg(long)]
        max_tilt: Option<i32>,

        /// Tilt step (degrees)
        #[arg(long)]
        tilt_increment: Option<i32>,
    },

    /// Stitch the frames of a stored run
    Stitch {
        /// Run directory name; the most recent run if omitted
        run: Option<String>,

        /// Use the linked native stitcher instead of the external program
        #[arg(long)]
        native: bool,
    },

    /// List stored runs
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = PanoSettings::load(cli.config.as_deref())?;
    init_logging(settings.level()?, settings.log_format)?;

    info!("=== Pan/Tilt Panorama v{} ===", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Capture {
            port,
            dry_run,
            max_pan,
            pan_increment,
            max_tilt,
            tilt_increment,
        } => {
            let grid = &mut settings.grid;
            grid.max_pan = max_pan.unwrap_or(grid.max_pan);
            grid.pan_increment = pan_increment.unwrap_or(grid.pan_increment);
            grid.max_tilt = max_tilt.unwrap_or(grid.max_tilt);
            grid.tilt_increment = tilt_increment.unwrap_or(grid.tilt_increment);

            let report = commands::capture(&settings, port.as_deref(), dry_run).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Stitch { run, native } => {
            let output = commands::stitch(&settings, run.as_deref(), native).await?;
            println!("{}", output.display());
        }
        Commands::List => {
            for run in commands::list(&settings)? {
                println!(
                    "{}  {:>3} frames  thumbnail: {}  result: {}",
                    run.name,
                    run.frames,
                    if run.thumbnail.is_some() { "yes" } else { "no" },
                    run.result
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "-".into()),
                );
            }
        }
    }

    Ok(())
}
