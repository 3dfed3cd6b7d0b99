//! Disc domain module
//!
//! Source addressing, the chapter table and track selections.

mod chapters;
mod selection;
mod source;

pub use chapters::{format_clock, ChapterTable, TimeRange};
pub use selection::TrackSelection;
pub use source::DiscSource;
