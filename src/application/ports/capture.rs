//! Disc capture port interface

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::application::cancel::CancelFlag;
use crate::domain::disc::DiscSource;

use super::{DiscReadError, ProgressCallback};

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Could not determine disc duration")]
    UnknownDuration,

    #[error("Could not read disc layout: {0}")]
    DiscUnreadable(String),

    #[error("Failed to start capture: {0}")]
    StartFailed(String),

    #[error("Capture failed: {0}")]
    Failed(String),

    #[error("Capture finished but produced no output file")]
    OutputMissing,

    #[error("Capture was cancelled")]
    Cancelled,
}

impl From<DiscReadError> for CaptureError {
    fn from(e: DiscReadError) -> Self {
        Self::DiscUnreadable(e.to_string())
    }
}

/// Port for capturing a whole disc session into one linear audio file
#[async_trait]
pub trait DiscCapture: Send + Sync {
    /// Capture `duration_secs` seconds of audio from `source` into
    /// `destination` in a single pass.
    ///
    /// # Arguments
    /// * `source` - Drive to read
    /// * `destination` - Linear (PCM WAV) output file
    /// * `duration_secs` - Disc length; must be positive
    /// * `on_progress` - Optional callback, fraction approaching 1.0
    /// * `cancel` - Job cancellation flag; a cancelled capture removes
    ///   its partial output and returns [`CaptureError::Cancelled`]
    async fn capture(
        &self,
        source: &DiscSource,
        destination: &Path,
        duration_secs: f64,
        on_progress: Option<ProgressCallback>,
        cancel: &CancelFlag,
    ) -> Result<(), CaptureError>;
}
