//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::audio::Bitrate;
use crate::domain::disc::DiscSource;
use crate::domain::job::DEFAULT_COMBINED_FILENAME;
use crate::domain::metadata::{FilenameTemplate, DEFAULT_FILENAME_TEMPLATE, DEFAULT_GENRE};

/// Default number of parallel encoders
pub const DEFAULT_ENCODE_WORKERS: usize = 4;

/// Default grace period before a cancelled subprocess is killed
pub const DEFAULT_CANCEL_GRACE_SECS: u64 = 5;

/// External tool locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    pub ffmpeg: Option<String>,
    pub ffprobe: Option<String>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub output_directory: Option<String>,
    pub drive: Option<String>,
    pub bitrate: Option<u32>,
    pub filename_template: Option<String>,
    pub combined_filename: Option<String>,
    pub genre: Option<String>,
    pub artist: Option<String>,
    pub narrator: Option<String>,
    pub encode_workers: Option<usize>,
    pub cancel_grace_secs: Option<u64>,
    pub tools: Option<ToolsConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            output_directory: None,
            drive: None,
            bitrate: Some(Bitrate::default().kbps()),
            filename_template: Some(DEFAULT_FILENAME_TEMPLATE.to_string()),
            combined_filename: Some(DEFAULT_COMBINED_FILENAME.to_string()),
            genre: Some(DEFAULT_GENRE.to_string()),
            artist: None,
            narrator: None,
            encode_workers: Some(DEFAULT_ENCODE_WORKERS),
            cancel_grace_secs: Some(DEFAULT_CANCEL_GRACE_SECS),
            tools: Some(ToolsConfig {
                ffmpeg: Some("ffmpeg".to_string()),
                ffprobe: Some("ffprobe".to_string()),
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            output_directory: other.output_directory.or(self.output_directory),
            drive: other.drive.or(self.drive),
            bitrate: other.bitrate.or(self.bitrate),
            filename_template: other.filename_template.or(self.filename_template),
            combined_filename: other.combined_filename.or(self.combined_filename),
            genre: other.genre.or(self.genre),
            artist: other.artist.or(self.artist),
            narrator: other.narrator.or(self.narrator),
            encode_workers: other.encode_workers.or(self.encode_workers),
            cancel_grace_secs: other.cancel_grace_secs.or(self.cancel_grace_secs),
            tools: Self::merge_tools_config(self.tools, other.tools),
        }
    }

    /// Merge tool sections
    fn merge_tools_config(
        base: Option<ToolsConfig>,
        other: Option<ToolsConfig>,
    ) -> Option<ToolsConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(ToolsConfig {
                ffmpeg: o.ffmpeg.or(b.ffmpeg),
                ffprobe: o.ffprobe.or(b.ffprobe),
            }),
        }
    }

    /// Get output directory, defaulting to ~/Music/Audiobooks
    pub fn output_directory_or_default(&self) -> PathBuf {
        match self.output_directory.as_deref().filter(|s| !s.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::audio_dir()
                .or_else(|| dirs::home_dir().map(|h| h.join("Music")))
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Audiobooks"),
        }
    }

    /// Get drive as DiscSource, or the platform default
    pub fn drive_or_default(&self) -> DiscSource {
        self.drive
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(DiscSource::new)
            .unwrap_or_default()
    }

    /// Get bitrate, or default if not set/invalid
    pub fn bitrate_or_default(&self) -> Bitrate {
        self.bitrate
            .and_then(|b| Bitrate::new(b).ok())
            .unwrap_or_default()
    }

    /// Get filename template, or the default template
    pub fn filename_template_or_default(&self) -> FilenameTemplate {
        self.filename_template
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(FilenameTemplate::new)
            .unwrap_or_default()
    }

    /// Get combined file name, or "audiobook.mp3"
    pub fn combined_filename_or_default(&self) -> &str {
        self.combined_filename
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_COMBINED_FILENAME)
    }

    /// Get genre, or "Audiobook"
    pub fn genre_or_default(&self) -> &str {
        self.genre.as_deref().unwrap_or(DEFAULT_GENRE)
    }

    /// Get encoder worker count (at least 1), or 4
    pub fn encode_workers_or_default(&self) -> usize {
        self.encode_workers
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_ENCODE_WORKERS)
    }

    /// Get cancel grace period, or 5 seconds
    pub fn cancel_grace_or_default(&self) -> std::time::Duration {
        std::time::Duration::from_secs(
            self.cancel_grace_secs
                .unwrap_or(DEFAULT_CANCEL_GRACE_SECS),
        )
    }

    /// Get ffmpeg executable, or "ffmpeg"
    pub fn ffmpeg_or_default(&self) -> &str {
        self.tools
            .as_ref()
            .and_then(|t| t.ffmpeg.as_deref())
            .unwrap_or("ffmpeg")
    }

    /// Get ffprobe executable, or "ffprobe"
    pub fn ffprobe_or_default(&self) -> &str {
        self.tools
            .as_ref()
            .and_then(|t| t.ffprobe.as_deref())
            .unwrap_or("ffprobe")
    }
}
