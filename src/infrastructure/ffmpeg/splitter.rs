//! Track splitting by time range

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::application::ports::{split_file_name, ProgressCallback, SplitError, TrackSplitter};
use crate::application::CancelFlag;
use crate::domain::disc::TimeRange;

use super::{FfmpegRun, FfmpegTools};

/// Cuts a linear WAV into one WAV per range, one ffmpeg call each
pub struct FfmpegSplitter {
    tools: FfmpegTools,
}

impl FfmpegSplitter {
    pub fn new(tools: FfmpegTools) -> Self {
        Self { tools }
    }

    fn build_args(source: &Path, range: &TimeRange, destination: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            source.to_string_lossy().to_string(),
            "-ss".to_string(),
            format!("{:.3}", range.start()),
            "-to".to_string(),
            format!("{:.3}", range.end()),
            "-acodec".to_string(),
            "pcm_s16le".to_string(),
            "-ar".to_string(),
            "44100".to_string(),
            "-ac".to_string(),
            "2".to_string(),
            destination.to_string_lossy().to_string(),
        ]
    }
}

async fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        let _ = tokio::fs::remove_file(path).await;
    }
}

#[async_trait]
impl TrackSplitter for FfmpegSplitter {
    async fn split(
        &self,
        source: &Path,
        destination_dir: &Path,
        ranges: &[TimeRange],
        on_progress: Option<ProgressCallback>,
        cancel: &CancelFlag,
    ) -> Result<Vec<PathBuf>, SplitError> {
        tokio::fs::create_dir_all(destination_dir)
            .await
            .map_err(|e| SplitError::StartFailed(e.to_string()))?;

        let runner = self.tools.runner();
        // A range in progress always runs to completion
        let uninterruptible = CancelFlag::new();
        let mut produced: Vec<PathBuf> = Vec::with_capacity(ranges.len());

        for (i, range) in ranges.iter().enumerate() {
            if cancel.is_cancelled() {
                remove_all(&produced).await;
                return Err(SplitError::Cancelled);
            }

            let destination = destination_dir.join(split_file_name(i));
            tracing::debug!(ordinal = i + 1, range = %range, "Splitting range");

            let run = FfmpegRun::new(Self::build_args(source, range, &destination));
            if let Err(e) = runner.run(run, &uninterruptible).await {
                let _ = tokio::fs::remove_file(&destination).await;
                remove_all(&produced).await;
                return Err(SplitError::RangeFailed {
                    ordinal: i + 1,
                    message: e.to_string(),
                });
            }

            produced.push(destination);
            if let Some(cb) = &on_progress {
                cb((i + 1) as f64 / ranges.len() as f64);
            }
        }

        Ok(produced)
    }
}
