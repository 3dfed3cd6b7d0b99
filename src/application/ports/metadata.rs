//! Metadata writer port interface

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::metadata::AudiobookMetadata;

/// Tag writing errors
#[derive(Debug, Clone, Error)]
pub enum MetadataError {
    #[error("File not found: {0}")]
    FileMissing(PathBuf),

    #[error("Failed to read existing tags: {0}")]
    ReadFailed(String),

    #[error("Failed to write tags: {0}")]
    WriteFailed(String),
}

/// Port for writing tag fields into a compressed file
#[async_trait]
pub trait MetadataWriter: Send + Sync {
    /// Replace the tag fields of `file` with `metadata` in one save.
    async fn write(&self, file: &Path, metadata: &AudiobookMetadata) -> Result<(), MetadataError>;
}
