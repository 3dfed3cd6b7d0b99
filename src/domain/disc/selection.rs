//! Track selection value object

use std::fmt;
use std::str::FromStr;

use crate::domain::error::TrackSelectionParseError;

/// Ordered list of 1-based track numbers parsed from "1-3,5,8".
///
/// Duplicates and zero are kept as written so that job validation can
/// report them; parsing only rejects malformed syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSelection(Vec<u32>);

impl TrackSelection {
    pub fn new(tracks: Vec<u32>) -> Self {
        Self(tracks)
    }

    pub fn tracks(&self) -> &[u32] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.0
    }
}

impl FromStr for TrackSelection {
    type Err = TrackSelectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || TrackSelectionParseError {
            input: s.to_string(),
        };

        let mut tracks = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(err());
            }

            match part.split_once('-') {
                Some((from, to)) => {
                    let from: u32 = from.trim().parse().map_err(|_| err())?;
                    let to: u32 = to.trim().parse().map_err(|_| err())?;
                    if from > to {
                        return Err(err());
                    }
                    tracks.extend(from..=to);
                }
                None => tracks.push(part.parse().map_err(|_| err())?),
            }
        }

        Ok(Self(tracks))
    }
}

impl fmt::Display for TrackSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|t| t.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}
