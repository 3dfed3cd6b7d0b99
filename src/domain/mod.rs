//! Domain layer - Core business logic
//!
//! Contains value objects, the rip job model, progress events and domain errors.
//! This layer has no dependencies on external systems.

pub mod audio;
pub mod config;
pub mod disc;
pub mod error;
pub mod job;
pub mod metadata;

// Re-export common types
pub use audio::Bitrate;
pub use config::AppConfig;
pub use disc::{ChapterTable, DiscSource, TimeRange, TrackSelection};
pub use error::*;
pub use job::{RipJob, RipMode, RipProgress, RipStatus};
pub use metadata::{AudiobookMetadata, CoverArt, FilenameTemplate};
