//! Track splitter port interface

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::application::cancel::CancelFlag;
use crate::domain::disc::TimeRange;

use super::ProgressCallback;

/// Split errors
#[derive(Debug, Clone, Error)]
pub enum SplitError {
    #[error("Failed to start splitter: {0}")]
    StartFailed(String),

    #[error("Failed to split range {ordinal}: {message}")]
    RangeFailed { ordinal: usize, message: String },

    #[error("Splitting was cancelled")]
    Cancelled,
}

/// Port for slicing a linear audio file into per-track files
#[async_trait]
pub trait TrackSplitter: Send + Sync {
    /// Produce one file per range in `destination_dir`, named by ordinal
    /// position (`track_01.wav`, `track_02.wav`, ...).
    ///
    /// All-or-nothing: on failure or cancellation the files produced so far
    /// are removed. Cancellation is observed between ranges only.
    ///
    /// # Returns
    /// The produced paths, in range order
    async fn split(
        &self,
        source: &Path,
        destination_dir: &Path,
        ranges: &[TimeRange],
        on_progress: Option<ProgressCallback>,
        cancel: &CancelFlag,
    ) -> Result<Vec<PathBuf>, SplitError>;
}

/// File name for the split output at 0-based `index`
pub fn split_file_name(index: usize) -> String {
    format!("track_{:02}.wav", index + 1)
}
