//! Gazemap CLI: replay recorded gaze streams and export heatmaps.
//!
//! Usage:
//!   gazemap replay <STREAM>       Run a recorded stream through a session
//!   gazemap heatmap <STREAM>      Replay a stream and export its heatmap PNG
//!   gazemap calibrate [OPTIONS]   Print calibration targets for a surface
//!   gazemap config                Show or write the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use gazemap_common::config::AppConfig;
use gazemap_common::logging::{init_logging, with_verbosity};

mod commands;

#[derive(Parser)]
#[command(
    name = "gazemap",
    about = "Gaze smoothing and attention heatmaps from eye-tracker streams",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the XDG config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recorded stream through a tracking session
    Replay {
        /// Path to the JSONL sample stream
        stream: PathBuf,

        /// Write the accepted-sample gaze log as JSONL
        #[arg(long)]
        gaze_log: Option<PathBuf>,

        /// Write the live points drawn at the display rate as JSONL
        #[arg(long)]
        frames: Option<PathBuf>,

        /// Display rate for live frames (Hz)
        #[arg(long, default_value = "60")]
        fps: u32,
    },

    /// Replay a stream and export the resulting heatmap
    Heatmap {
        /// Path to the JSONL sample stream
        stream: PathBuf,

        /// Output PNG path (defaults to <output_dir>/<stream>-heatmap.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stimulus image to draw the heatmap over
        #[arg(short, long)]
        background: Option<PathBuf>,
    },

    /// Print calibration targets for a surface
    Calibrate {
        /// Surface left edge (screen px)
        #[arg(long, default_value = "0")]
        left: f64,

        /// Surface top edge (screen px)
        #[arg(long, default_value = "0")]
        top: f64,

        /// Surface width (px)
        #[arg(long)]
        width: f64,

        /// Surface height (px)
        #[arg(long)]
        height: f64,

        /// Print targets as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        write: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };
    init_logging(&with_verbosity(&config.logging, cli.verbose))?;

    match cli.command {
        Commands::Replay {
            stream,
            gaze_log,
            frames,
            fps,
        } => commands::replay::run(&config, stream, gaze_log, frames, fps),
        Commands::Heatmap {
            stream,
            output,
            background,
        } => commands::heatmap::run(&config, stream, output, background),
        Commands::Calibrate {
            left,
            top,
            width,
            height,
            json,
        } => commands::calibrate::run(left, top, width, height, json),
        Commands::Config { write } => commands::config::run(&config, cli.config, write),
    }
}
