//! Encoder port interface

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::application::cancel::CancelFlag;
use crate::domain::audio::Bitrate;

use super::ProgressCallback;

/// Encoding errors
#[derive(Debug, Clone, Error)]
pub enum EncodeError {
    #[error("Input file not found: {0}")]
    SourceMissing(PathBuf),

    #[error("Failed to start encoder: {0}")]
    StartFailed(String),

    #[error("Encoding failed: {0}")]
    Failed(String),

    #[error("Encoding was cancelled")]
    Cancelled,
}

impl EncodeError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Port for transcoding a linear audio file into a compressed file
#[async_trait]
pub trait AudioEncoder: Send + Sync {
    /// Encode `source` into `destination` at `bitrate`.
    ///
    /// On failure or cancellation any partial `destination` is removed.
    async fn encode(
        &self,
        source: &Path,
        destination: &Path,
        bitrate: Bitrate,
        on_progress: Option<ProgressCallback>,
        cancel: &CancelFlag,
    ) -> Result<(), EncodeError>;
}
