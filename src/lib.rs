//! Audiobook Ripper - turn audiobook CDs into tagged MP3 files
//!
//! This crate reads a disc once, splits it into tracks, encodes the tracks
//! in parallel with FFmpeg and writes ID3 tags, reporting one overall
//! progress figure and cleaning up its scratch files on every exit path.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects, the rip job model, progress events and errors
//! - **Application**: The rip pipeline, worker pool, cancellation and port traits
//! - **Infrastructure**: Adapter implementations (FFmpeg, ffprobe, ID3, config file)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
