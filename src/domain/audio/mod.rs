//! Audio output domain module

mod bitrate;

pub use bitrate::{Bitrate, DEFAULT_BITRATE_KBPS, SUPPORTED_BITRATES};
