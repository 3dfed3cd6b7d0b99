//! Metadata domain module

mod audiobook;
mod filename;

pub use audiobook::{AudiobookMetadata, CoverArt, DEFAULT_GENRE};
pub use filename::{sanitize_title, FilenameTemplate, DEFAULT_FILENAME_TEMPLATE};
