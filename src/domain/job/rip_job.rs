//! Rip job definition

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::domain::audio::Bitrate;
use crate::domain::disc::{ChapterTable, DiscSource};
use crate::domain::error::InputError;
use crate::domain::metadata::AudiobookMetadata;

/// Default name of the single output file in combined mode
pub const DEFAULT_COMBINED_FILENAME: &str = "audiobook.mp3";

/// Execution mode of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RipMode {
    /// One output file for the whole disc
    Combined {
        /// File name inside the destination directory
        filename: String,
        /// Title tag for the combined file (defaults to the first track's title)
        title: Option<String>,
    },
    /// One output file per selected track
    Split,
}

impl RipMode {
    pub fn combined(filename: impl Into<String>) -> Self {
        Self::Combined {
            filename: filename.into(),
            title: None,
        }
    }

    pub fn is_combined(&self) -> bool {
        matches!(self, Self::Combined { .. })
    }
}

impl Default for RipMode {
    fn default() -> Self {
        Self::Split
    }
}

/// A request to convert tracks of one disc into tagged files.
/// Immutable once submitted.
#[derive(Debug, Clone)]
pub struct RipJob {
    /// Drive or image to read from
    pub source: DiscSource,
    /// Tracks to produce, 1-based, in output order
    pub tracks: Vec<u32>,
    /// Directory receiving the finished files
    pub output_dir: PathBuf,
    /// Per-track metadata (may be sparse)
    pub metadata: BTreeMap<u32, AudiobookMetadata>,
    /// Target bitrate for encoding
    pub bitrate: Bitrate,
    /// Combined or split output
    pub mode: RipMode,
}

impl RipJob {
    pub fn new(source: DiscSource, tracks: Vec<u32>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            tracks,
            output_dir: output_dir.into(),
            metadata: BTreeMap::new(),
            bitrate: Bitrate::default(),
            mode: RipMode::Split,
        }
    }

    pub fn with_mode(mut self, mode: RipMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_bitrate(mut self, bitrate: Bitrate) -> Self {
        self.bitrate = bitrate;
        self
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<u32, AudiobookMetadata>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Check parameters that do not depend on the disc
    pub fn validate(&self) -> Result<(), InputError> {
        if self.tracks.is_empty() {
            return Err(InputError::NoTracks);
        }

        let mut seen = HashSet::with_capacity(self.tracks.len());
        for &track in &self.tracks {
            if track == 0 {
                return Err(InputError::InvalidTrackNumber(track));
            }
            if !seen.insert(track) {
                return Err(InputError::DuplicateTrack(track));
            }
        }

        if let RipMode::Combined { filename, .. } = &self.mode {
            if filename.trim().is_empty() {
                return Err(InputError::EmptyCombinedFilename);
            }
            if filename.contains(['/', '\\']) || matches!(filename.trim(), "." | "..") {
                return Err(InputError::InvalidCombinedFilename(filename.clone()));
            }
        }

        Ok(())
    }

    /// Check that every selected track exists on the disc
    pub fn validate_against(&self, chapters: &ChapterTable) -> Result<(), InputError> {
        match self.tracks.iter().find(|&&t| chapters.range(t).is_none()) {
            Some(&track) => Err(InputError::TrackOutOfRange {
                track,
                available: chapters.len(),
            }),
            None => Ok(()),
        }
    }

    /// Number of units progress is reported in: one per output file
    pub fn reporting_units(&self) -> u32 {
        match self.mode {
            RipMode::Combined { .. } => 1,
            RipMode::Split => self.tracks.len() as u32,
        }
    }

    /// Metadata for a track, falling back to a record holding only its number
    pub fn metadata_for(&self, track: u32) -> AudiobookMetadata {
        let mut meta = self
            .metadata
            .get(&track)
            .cloned()
            .unwrap_or_else(|| AudiobookMetadata::for_track(track));
        if meta.track_number == 0 {
            meta.track_number = track;
        }
        meta
    }

    /// Path of the combined output file, if in combined mode
    pub fn combined_output(&self) -> Option<PathBuf> {
        match &self.mode {
            RipMode::Combined { filename, .. } => Some(self.output_dir.join(filename.trim())),
            RipMode::Split => None,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
