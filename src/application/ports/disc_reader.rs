//! Disc reader port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::disc::{ChapterTable, DiscSource};

/// Disc reading errors
#[derive(Debug, Clone, Error)]
pub enum DiscReadError {
    #[error("Disc tool not found: {0}")]
    ToolNotFound(String),

    #[error("Failed to read disc: {0}")]
    ProbeFailed(String),

    #[error("Failed to parse chapter information: {0}")]
    ParseError(String),
}

/// Port for reading the track layout of a disc
#[async_trait]
pub trait DiscReader: Send + Sync {
    /// Read the chapter table of the disc in `source`.
    ///
    /// An empty table means the layout (and therefore the disc
    /// duration) could not be determined.
    async fn chapters(&self, source: &DiscSource) -> Result<ChapterTable, DiscReadError>;
}
