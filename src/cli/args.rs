//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::audio::Bitrate;
use crate::domain::disc::TrackSelection;

/// Audiobook Ripper - turn audiobook CDs into tagged MP3 files
#[derive(Parser, Debug)]
#[command(name = "audiobook-ripper")]
#[command(version)]
#[command(about = "Rip audiobook CDs into tagged MP3 files using FFmpeg")]
#[command(long_about = None)]
pub struct Cli {
    /// Log pipeline details to stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rip tracks from a disc
    Rip(RipArgs),
    /// Show the disc's track layout
    Chapters {
        /// Drive letter or device path
        #[arg(short = 'd', long, value_name = "DRIVE")]
        drive: Option<String>,
    },
    /// Check that FFmpeg can read CDs and write MP3
    Check,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options of the `rip` subcommand
#[derive(Args, Debug, Default)]
pub struct RipArgs {
    /// Drive letter or device path
    #[arg(short = 'd', long, value_name = "DRIVE")]
    pub drive: Option<String>,

    /// Tracks to rip (e.g., 1-3,5); all tracks if omitted
    #[arg(short = 't', long, value_name = "LIST")]
    pub tracks: Option<TrackSelection>,

    /// Destination directory
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// MP3 bitrate in kbps
    #[arg(short = 'b', long, value_name = "KBPS")]
    pub bitrate: Option<Bitrate>,

    /// Produce a single file for the whole disc
    #[arg(long)]
    pub combine: bool,

    /// File name of the combined file
    #[arg(long, value_name = "FILE", requires = "combine")]
    pub combined_name: Option<String>,

    /// Title tag of the combined file
    #[arg(long, value_name = "TITLE", requires = "combine")]
    pub combined_title: Option<String>,

    /// Book title (album tag)
    #[arg(long)]
    pub album: Option<String>,

    /// Author (artist tag)
    #[arg(long)]
    pub artist: Option<String>,

    /// Narrator (album artist tag)
    #[arg(long)]
    pub narrator: Option<String>,

    /// Genre tag
    #[arg(long)]
    pub genre: Option<String>,

    /// Release year
    #[arg(long)]
    pub year: Option<i32>,

    /// Series name
    #[arg(long)]
    pub series: Option<String>,

    /// Position in the series
    #[arg(long, value_name = "N")]
    pub series_number: Option<String>,

    /// Disc number within the book
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub disc: Option<u32>,

    /// Number of discs in the book
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub total_discs: Option<u32>,

    /// Cover image (JPEG or PNG)
    #[arg(long, value_name = "FILE")]
    pub cover: Option<PathBuf>,

    /// Title for one track, repeatable (e.g., --title "3=The Storm")
    #[arg(long = "title", value_name = "N=TEXT", value_parser = parse_title_override)]
    pub titles: Vec<(u32, String)>,

    /// Parallel encoders in split mode
    #[arg(short = 'w', long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..=64))]
    pub workers: Option<u16>,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Parse `N=TEXT` into a track number and title
pub fn parse_title_override(input: &str) -> Result<(u32, String), String> {
    let (track, title) = input
        .split_once('=')
        .ok_or_else(|| format!("expected N=TEXT, got \"{}\"", input))?;
    let track: u32 = track
        .trim()
        .parse()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| format!("invalid track number in \"{}\"", input))?;
    Ok((track, title.trim().to_string()))
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "output_directory",
    "drive",
    "bitrate",
    "filename_template",
    "combined_filename",
    "genre",
    "artist",
    "narrator",
    "encode_workers",
    "cancel_grace_secs",
    "tools.ffmpeg",
    "tools.ffprobe",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
