//! Progress events emitted while a job runs

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Status tag carried by every progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RipStatus {
    Capturing,
    Splitting,
    Encoding,
    WritingMetadata,
    Encoded,
    Warning,
    Error,
    Complete,
    Cancelled,
}

impl RipStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Capturing => "capturing",
            Self::Splitting => "splitting",
            Self::Encoding => "encoding",
            Self::WritingMetadata => "writing-metadata",
            Self::Encoded => "encoded",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Complete => "complete",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether this status reports a pipeline stage at work.
    ///
    /// `Error` is not a stage and is not always final either: it ends the
    /// stream for a failed job but also reports single-track failures.
    pub const fn is_stage(&self) -> bool {
        matches!(
            self,
            Self::Capturing | Self::Splitting | Self::Encoding | Self::WritingMetadata | Self::Encoded
        )
    }
}

impl fmt::Display for RipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One progress notification. Immutable after construction.
///
/// `current_track`/`fraction` form the discrete counter: the overall
/// progress is `((current_track - 1) + fraction) / total_tracks`.
/// `track` names the disc track the event is about (1 for whole-job
/// events).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RipProgress {
    current_track: u32,
    total_tracks: u32,
    fraction: f64,
    current_file: Option<PathBuf>,
    status: RipStatus,
    error: Option<String>,
    track: u32,
}

impl RipProgress {
    pub fn new(current_track: u32, total_tracks: u32, fraction: f64, status: RipStatus) -> Self {
        Self {
            current_track: current_track.max(1),
            total_tracks,
            fraction: fraction.clamp(0.0, 1.0),
            current_file: None,
            status,
            error: None,
            track: 1,
        }
    }

    /// Build the counter form of a global progress figure `overall` for a
    /// job reported in `total_tracks` units.
    pub fn from_overall(overall: f64, total_tracks: u32, status: RipStatus) -> Self {
        let total = total_tracks.max(1);
        let scaled = overall.clamp(0.0, 1.0) * total as f64;
        let completed = (scaled.floor() as u32).min(total - 1);
        let fraction = scaled - completed as f64;
        Self::new(completed + 1, total, fraction, status)
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.current_file = Some(path.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    pub fn with_track(mut self, track: u32) -> Self {
        self.track = track;
        self
    }

    pub fn current_track(&self) -> u32 {
        self.current_track
    }

    pub fn total_tracks(&self) -> u32 {
        self.total_tracks
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    pub fn status(&self) -> RipStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn track(&self) -> u32 {
        self.track
    }

    /// Overall job progress in `[0, 1]`
    pub fn overall_progress(&self) -> f64 {
        if self.total_tracks == 0 {
            return 0.0;
        }
        let completed = (self.current_track - 1) as f64;
        (completed + self.fraction) / self.total_tracks as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_progress_formula() {
        let p = RipProgress::new(3, 4, 0.5, RipStatus::Encoding);
        assert_eq!(p.overall_progress(), 2.5 / 4.0);
    }

    #[test]
    fn zero_total_is_zero_progress() {
        let p = RipProgress::new(1, 0, 0.7, RipStatus::Capturing);
        assert_eq!(p.overall_progress(), 0.0);
    }

    #[test]
    fn from_overall_preserves_global_value() {
        for &g in &[0.0, 0.1, 0.4, 0.5, 0.95, 1.0] {
            let p = RipProgress::from_overall(g, 5, RipStatus::Encoding);
            assert!((p.overall_progress() - g).abs() < 1e-12, "g = {}", g);
            assert!(p.current_track() >= 1 && p.current_track() <= 5);
        }
    }

    #[test]
    fn from_overall_counter_for_single_unit() {
        let p = RipProgress::from_overall(1.0, 1, RipStatus::Complete);
        assert_eq!(p.current_track(), 1);
        assert_eq!(p.fraction(), 1.0);
    }

    #[test]
    fn from_overall_counter_advances_per_track() {
        let p = RipProgress::from_overall(0.5, 4, RipStatus::Encoding);
        assert_eq!(p.current_track(), 3);
        assert_eq!(p.fraction(), 0.0);
    }

    #[test]
    fn status_tags_are_kebab_case() {
        assert_eq!(RipStatus::WritingMetadata.to_string(), "writing-metadata");
        assert!(RipStatus::Encoded.is_stage());
        assert!(!RipStatus::Complete.is_stage());
        assert!(!RipStatus::Error.is_stage());
    }

    #[test]
    fn builder_fields() {
        let p = RipProgress::new(1, 2, 0.0, RipStatus::Error)
            .with_track(7)
            .with_error("boom")
            .with_file("/tmp/x.mp3");
        assert_eq!(p.track(), 7);
        assert_eq!(p.error(), Some("boom"));
        assert_eq!(p.current_file(), Some(Path::new("/tmp/x.mp3")));
    }
}
