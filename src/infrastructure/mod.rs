//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with FFmpeg, ffprobe, ID3 tags and the config file.

pub mod config;
pub mod ffmpeg;
pub mod metadata;

// Re-export adapters
pub use config::XdgConfigStore;
pub use ffmpeg::{
    check_toolchain, FfmpegCapture, FfmpegEncoder, FfmpegSplitter, FfmpegTools,
    FfprobeDiscReader, ToolchainReport,
};
pub use metadata::Id3MetadataWriter;
