//! Domain error types

use thiserror::Error;

/// Error when parsing a bitrate string
#[derive(Debug, Clone, Error)]
#[error("Invalid bitrate: \"{input}\". Expected one of: 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320 (kbps)")]
pub struct BitrateParseError {
    pub input: String,
}

/// Error when parsing a track selection such as "1-3,5"
#[derive(Debug, Clone, Error)]
#[error("Invalid track selection: \"{input}\". Expected 1-based numbers and ranges (e.g., 1,2,5 or 1-4,7)")]
pub struct TrackSelectionParseError {
    pub input: String,
}

/// Invalid rip job parameters, detected before any stage runs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("No tracks selected")]
    NoTracks,

    #[error("Track numbers are 1-based, got {0}")]
    InvalidTrackNumber(u32),

    #[error("Track {0} was selected more than once")]
    DuplicateTrack(u32),

    #[error("Track {track} not found on disc ({available} tracks available)")]
    TrackOutOfRange { track: u32, available: usize },

    #[error("Combined file name must not be empty")]
    EmptyCombinedFilename,

    #[error("Combined file name must not contain path separators: {0}")]
    InvalidCombinedFilename(String),
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
