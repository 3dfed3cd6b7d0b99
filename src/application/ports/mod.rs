//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers. Every long-running port takes the job's
//! [`CancelFlag`](crate::application::CancelFlag) and must tear down its
//! own subprocess before returning.

pub mod capture;
pub mod config;
pub mod disc_reader;
pub mod encoder;
pub mod metadata;
pub mod splitter;

use std::sync::Arc;

/// Progress callback type for reporting stage-local progress.
/// Parameter: fraction complete in `[0.0, 1.0]`.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

// Re-export common types
pub use capture::{CaptureError, DiscCapture};
pub use config::ConfigStore;
pub use disc_reader::{DiscReadError, DiscReader};
pub use encoder::{AudioEncoder, EncodeError};
pub use metadata::{MetadataError, MetadataWriter};
pub use splitter::{split_file_name, SplitError, TrackSplitter};
