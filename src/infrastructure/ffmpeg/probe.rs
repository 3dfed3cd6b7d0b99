//! ffprobe-based disc reader and duration probe

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::application::ports::{DiscReadError, DiscReader};
use crate::domain::disc::{ChapterTable, DiscSource, TimeRange};

use super::FfmpegTools;

/// Reading the table of contents can spin up the drive
const CHAPTER_PROBE_TIMEOUT: Duration = Duration::from_secs(30);
const DURATION_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    chapters: Vec<ProbeChapter>,
}

#[derive(Debug, Deserialize)]
struct ProbeChapter {
    start_time: String,
    end_time: String,
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// Parse `ffprobe -show_chapters -of json` output
pub fn parse_chapters(json: &str) -> Result<ChapterTable, DiscReadError> {
    let output: ProbeOutput =
        serde_json::from_str(json).map_err(|e| DiscReadError::ParseError(e.to_string()))?;

    let mut entries = Vec::with_capacity(output.chapters.len());
    for (i, chapter) in output.chapters.into_iter().enumerate() {
        let start = parse_seconds(&chapter.start_time)?;
        let end = parse_seconds(&chapter.end_time)?;
        let range = TimeRange::new(start, end).ok_or_else(|| {
            DiscReadError::ParseError(format!(
                "chapter {} has invalid range {}..{}",
                i + 1,
                start,
                end
            ))
        })?;
        let title = chapter
            .tags
            .get("title")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        entries.push((range, title));
    }

    Ok(ChapterTable::with_titles(entries))
}

fn parse_seconds(value: &str) -> Result<f64, DiscReadError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DiscReadError::ParseError(format!("invalid time value: {}", value)))
}

/// Disc reader backed by ffprobe's libcdio demuxer.
///
/// Tables are cached per source for the reader's lifetime; empty results
/// are not cached so a disc inserted later can still be read.
pub struct FfprobeDiscReader {
    tools: FfmpegTools,
    cache: Mutex<HashMap<DiscSource, ChapterTable>>,
}

impl FfprobeDiscReader {
    pub fn new(tools: FfmpegTools) -> Self {
        Self {
            tools,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, source: &DiscSource) -> Option<ChapterTable> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(source)
            .cloned()
    }

    fn store(&self, source: &DiscSource, table: &ChapterTable) {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(source.clone(), table.clone());
    }
}

#[async_trait]
impl DiscReader for FfprobeDiscReader {
    async fn chapters(&self, source: &DiscSource) -> Result<ChapterTable, DiscReadError> {
        if let Some(table) = self.cached(source) {
            return Ok(table);
        }

        let device = source.device();
        tracing::debug!(device = %device, "Reading chapter table");

        let output = Command::new(&self.tools.ffprobe)
            .args(["-v", "error", "-show_chapters", "-of", "json", "-f", "libcdio", "-i"])
            .arg(&device)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(CHAPTER_PROBE_TIMEOUT, output).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DiscReadError::ToolNotFound(self.tools.ffprobe.clone()))
            }
            Ok(Err(e)) => return Err(DiscReadError::ProbeFailed(e.to_string())),
            Err(_) => {
                return Err(DiscReadError::ProbeFailed(format!(
                    "timed out after {}s reading {}",
                    CHAPTER_PROBE_TIMEOUT.as_secs(),
                    device
                )))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.lines().last().unwrap_or("unknown error").trim().to_string();
            return Err(DiscReadError::ProbeFailed(format!("{}: {}", device, message)));
        }

        let table = parse_chapters(&String::from_utf8_lossy(&output.stdout))?;
        tracing::info!(device = %device, tracks = table.len(), "Read chapter table");
        if !table.is_empty() {
            self.store(source, &table);
        }
        Ok(table)
    }
}

/// Duration of an audio file in seconds, if ffprobe can tell
pub async fn probe_duration(ffprobe: &str, path: &Path) -> Option<f64> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-show_entries",
            "format=duration",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(DURATION_PROBE_TIMEOUT, output).await {
        Ok(Ok(output)) if output.status.success() => String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d > 0.0),
        Ok(Ok(_)) => None,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "Duration probe failed to start");
            None
        }
        Err(_) => {
            tracing::debug!(path = %path.display(), "Duration probe timed out");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "chapters": [
            {"id": 0, "time_base": "1/44100", "start": 0, "start_time": "0.000000",
             "end": 13230000, "end_time": "300.000000", "tags": {"title": "Opening"}},
            {"id": 1, "time_base": "1/44100", "start": 13230000, "start_time": "300.000000",
             "end": 26460000, "end_time": "600.000000"}
        ]
    }"#;

    #[test]
    fn parses_ranges_and_titles() {
        let table = parse_chapters(SAMPLE).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.range(1), TimeRange::new(0.0, 300.0));
        assert_eq!(table.range(2), TimeRange::new(300.0, 600.0));
        assert_eq!(table.title(1), Some("Opening"));
        assert_eq!(table.title(2), None);
        assert_eq!(table.total_duration(), 600.0);
    }

    #[test]
    fn missing_chapters_key_is_empty_table() {
        let table = parse_chapters("{}").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn invalid_json_is_parse_error() {
        assert!(matches!(
            parse_chapters("not json"),
            Err(DiscReadError::ParseError(_))
        ));
    }

    #[test]
    fn inverted_range_is_parse_error() {
        let json = r#"{"chapters": [{"start_time": "10.0", "end_time": "5.0"}]}"#;
        assert!(matches!(parse_chapters(json), Err(DiscReadError::ParseError(_))));
    }

    #[tokio::test]
    async fn missing_ffprobe_is_tool_not_found() {
        let tools = FfmpegTools {
            ffprobe: "definitely-not-ffprobe-xyz".to_string(),
            ..FfmpegTools::default()
        };
        let reader = FfprobeDiscReader::new(tools);
        let result = reader.chapters(&DiscSource::new("/dev/null")).await;
        assert!(matches!(result, Err(DiscReadError::ToolNotFound(_))));
    }

    #[tokio::test]
    async fn duration_probe_tolerates_missing_tool() {
        assert_eq!(
            probe_duration("definitely-not-ffprobe-xyz", Path::new("/nonexistent.wav")).await,
            None
        );
    }
}
