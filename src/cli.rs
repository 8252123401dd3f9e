//! Command-line interface definitions for qrscan.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//!
//! # Example
//!
//! ```bash
//! # Interactive scanner, camera frames read from ./frames
//! qrscan scan --frames ./frames
//!
//! # Start the TUI directly on an uploaded image
//! qrscan scan --file badge.png
//!
//! # Headless decode with JSON output for scripting
//! qrscan decode --file badge.png --output json
//!
//! # Headless camera scan with a 5 second limit
//! qrscan -v decode --camera --frames /run/capture --timeout 5
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::capture::FacingMode;

/// QR scan sessions from a camera frame source or an uploaded image.
#[derive(Debug, Parser)]
#[command(name = "qrscan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report errors as JSON objects on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML); defaults to the platform config directory
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Open the interactive scanner
    Scan(ScanArgs),
    /// Run a single scan attempt without the TUI and print the result
    Decode(DecodeArgs),
}

/// Camera settings shared by both subcommands.
///
/// Every flag overrides the matching configuration value.
#[derive(Debug, Clone, Default, Args)]
pub struct CameraArgs {
    /// Frame-source directory standing in for the camera stream
    #[arg(long, value_name = "DIR")]
    pub frames: Option<PathBuf>,

    /// Frames sampled per second (1-60)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=60))]
    pub fps: Option<u32>,

    /// Side length in pixels of the centered scan box
    #[arg(long, value_name = "PX", value_parser = clap::value_parser!(u32).range(16..))]
    pub box_size: Option<u32>,

    /// Preferred camera
    #[arg(long, value_enum)]
    pub facing: Option<FacingMode>,

    /// Keep sampling the frame source instead of giving up after the last frame
    #[arg(long)]
    pub loop_frames: bool,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Open the camera immediately
    #[arg(long, conflicts_with = "file")]
    pub camera: bool,

    /// Scan this image immediately
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Use ASCII borders (screen-reader friendly)
    #[arg(long)]
    pub ascii: bool,

    /// Color theme
    #[arg(long, value_enum)]
    pub theme: Option<ThemeArg>,

    #[command(flatten)]
    pub camera_args: CameraArgs,
}

/// Arguments for the decode subcommand.
#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Image file to decode
    #[arg(long, value_name = "PATH", required_unless_present = "camera")]
    pub file: Option<PathBuf>,

    /// Scan the camera frame source instead of a file
    #[arg(long, conflicts_with = "file")]
    pub camera: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Give up after this many seconds without an outcome
    #[arg(long, value_name = "SECS", default_value = "30")]
    pub timeout: u64,

    #[command(flatten)]
    pub camera_args: CameraArgs,
}

/// Output format for headless results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// TUI color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeArg {
    /// Pick from the terminal environment
    #[default]
    Auto,
    /// Light text on dark background
    Dark,
    /// Dark text on light background
    Light,
}
