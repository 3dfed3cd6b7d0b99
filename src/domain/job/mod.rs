//! Rip job domain module

mod progress;
mod rip_job;

pub use progress::{RipProgress, RipStatus};
pub use rip_job::{RipJob, RipMode, DEFAULT_COMBINED_FILENAME};
