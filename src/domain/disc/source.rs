//! Disc source identifier

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies the optical drive (or disc image) to read from.
///
/// A bare drive letter such as `D` is addressed as `D:`; anything else
/// (e.g. `/dev/cdrom`) is passed to the disc tools verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscSource(String);

impl DiscSource {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    /// The identifier as supplied by the user
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Device argument for libcdio-based tools
    pub fn device(&self) -> String {
        let mut chars = self.0.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) if letter.is_ascii_alphabetic() => {
                format!("{}:", letter.to_ascii_uppercase())
            }
            _ => self.0.clone(),
        }
    }
}

impl Default for DiscSource {
    fn default() -> Self {
        if cfg!(windows) {
            Self::new("D")
        } else {
            Self::new("/dev/cdrom")
        }
    }
}

impl From<&str> for DiscSource {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for DiscSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
