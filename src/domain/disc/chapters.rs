//! Chapter table value objects

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `(start, end)` span on the disc in seconds, `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    start: f64,
    end: f64,
}

impl TimeRange {
    /// Create a range; returns `None` unless `0 <= start < end`
    pub fn new(start: f64, end: f64) -> Option<Self> {
        if start.is_finite() && end.is_finite() && start >= 0.0 && end > start {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            format_clock(self.start),
            format_clock(self.end)
        )
    }
}

/// Ordered track ranges of one disc, plus any titles the disc carries.
///
/// Fetched once per job and read-only afterwards. Track `n` (1-based)
/// is the `n-1`th entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterTable {
    ranges: Vec<TimeRange>,
    titles: Vec<Option<String>>,
}

impl ChapterTable {
    pub fn new(ranges: Vec<TimeRange>) -> Self {
        let titles = vec![None; ranges.len()];
        Self { ranges, titles }
    }

    /// Build a table with per-track titles (missing titles are `None`)
    pub fn with_titles(entries: Vec<(TimeRange, Option<String>)>) -> Self {
        let (ranges, titles) = entries.into_iter().unzip();
        Self { ranges, titles }
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Range of a 1-based track number
    pub fn range(&self, track: u32) -> Option<TimeRange> {
        let index = (track as usize).checked_sub(1)?;
        self.ranges.get(index).copied()
    }

    /// Title stored on the disc for a 1-based track number
    pub fn title(&self, track: u32) -> Option<&str> {
        let index = (track as usize).checked_sub(1)?;
        self.titles.get(index).and_then(|t| t.as_deref())
    }

    pub fn ranges(&self) -> &[TimeRange] {
        &self.ranges
    }

    /// Total disc duration in seconds (end of the last track), 0 when empty
    pub fn total_duration(&self) -> f64 {
        self.ranges.last().map(|r| r.end()).unwrap_or(0.0)
    }

    /// All track numbers on the disc
    pub fn track_numbers(&self) -> Vec<u32> {
        (1..=self.ranges.len() as u32).collect()
    }
}

/// Format seconds as `M:SS`
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ChapterTable {
        ChapterTable::with_titles(vec![
            (TimeRange::new(0.0, 300.5).unwrap(), Some("Opening".to_string())),
            (TimeRange::new(300.5, 601.0).unwrap(), None),
            (TimeRange::new(601.0, 900.0).unwrap(), None),
        ])
    }

    #[test]
    fn time_range_rejects_inverted_or_empty() {
        assert!(TimeRange::new(10.0, 10.0).is_none());
        assert!(TimeRange::new(10.0, 5.0).is_none());
        assert!(TimeRange::new(-1.0, 5.0).is_none());
        assert!(TimeRange::new(f64::NAN, 5.0).is_none());
    }

    #[test]
    fn time_range_duration() {
        let range = TimeRange::new(1.5, 4.0).unwrap();
        assert_eq!(range.duration(), 2.5);
    }

    #[test]
    fn lookup_is_one_based() {
        let table = table();
        assert_eq!(table.range(1).unwrap().start(), 0.0);
        assert_eq!(table.range(3).unwrap().end(), 900.0);
        assert!(table.range(0).is_none());
        assert!(table.range(4).is_none());
    }

    #[test]
    fn titles_are_sparse() {
        let table = table();
        assert_eq!(table.title(1), Some("Opening"));
        assert_eq!(table.title(2), None);
    }

    #[test]
    fn total_duration_is_last_end() {
        assert_eq!(table().total_duration(), 900.0);
        assert_eq!(ChapterTable::default().total_duration(), 0.0);
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(301.9), "5:01");
    }
}
