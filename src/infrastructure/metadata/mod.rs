//! Tag writing adapters

mod id3_writer;

pub use id3_writer::{apply_metadata, Id3MetadataWriter};
