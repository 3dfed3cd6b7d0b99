//! FFmpeg and ffprobe adapters

mod capture;
mod encoder;
mod probe;
mod process;
mod splitter;
mod toolchain;

use std::time::Duration;

use crate::domain::config::AppConfig;

pub use capture::FfmpegCapture;
pub use encoder::FfmpegEncoder;
pub use probe::{parse_chapters, FfprobeDiscReader};
pub use process::{parse_progress_line, FfmpegRun, FfmpegRunner, RunEnd, RunError};
pub use splitter::FfmpegSplitter;
pub use toolchain::{check_toolchain, ToolchainReport};

/// Tool locations and subprocess policy shared by the adapters
#[derive(Debug, Clone)]
pub struct FfmpegTools {
    pub ffmpeg: String,
    pub ffprobe: String,
    /// Time a cancelled process gets to exit before it is killed
    pub cancel_grace: Duration,
}

impl FfmpegTools {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_or_default().to_string(),
            ffprobe: config.ffprobe_or_default().to_string(),
            cancel_grace: config.cancel_grace_or_default(),
        }
    }

    pub fn runner(&self) -> FfmpegRunner {
        FfmpegRunner::new(self.ffmpeg.clone(), self.cancel_grace)
    }
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self::from_config(&AppConfig::defaults())
    }
}
