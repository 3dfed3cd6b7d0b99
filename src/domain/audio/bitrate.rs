//! Bitrate value object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::BitrateParseError;

/// Default MP3 bitrate in kbps
pub const DEFAULT_BITRATE_KBPS: u32 = 192;

/// Bitrates supported by MPEG-1 Layer III
pub const SUPPORTED_BITRATES: &[u32] = &[
    32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];

/// Target bitrate for compressed output, in kbps.
/// Only values from [`SUPPORTED_BITRATES`] can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Bitrate {
    kbps: u32,
}

impl Bitrate {
    /// Create a bitrate, rejecting values the encoder cannot produce
    pub fn new(kbps: u32) -> Result<Self, BitrateParseError> {
        if SUPPORTED_BITRATES.contains(&kbps) {
            Ok(Self { kbps })
        } else {
            Err(BitrateParseError {
                input: kbps.to_string(),
            })
        }
    }

    pub const fn kbps(&self) -> u32 {
        self.kbps
    }

    /// FFmpeg `-b:a` argument value (e.g. "192k")
    pub fn as_ffmpeg_arg(&self) -> String {
        format!("{}k", self.kbps)
    }
}

impl Default for Bitrate {
    fn default() -> Self {
        Self {
            kbps: DEFAULT_BITRATE_KBPS,
        }
    }
}

impl TryFrom<u32> for Bitrate {
    type Error = BitrateParseError;

    fn try_from(kbps: u32) -> Result<Self, Self::Error> {
        Self::new(kbps)
    }
}

impl From<Bitrate> for u32 {
    fn from(bitrate: Bitrate) -> Self {
        bitrate.kbps
    }
}

impl FromStr for Bitrate {
    type Err = BitrateParseError;

    /// Accepts "192" or "192k"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_lowercase();
        let digits = trimmed.strip_suffix('k').unwrap_or(&trimmed);
        let kbps: u32 = digits.parse().map_err(|_| BitrateParseError {
            input: s.to_string(),
        })?;
        Self::new(kbps).map_err(|_| BitrateParseError {
            input: s.to_string(),
        })
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kbps", self.kbps)
    }
}
