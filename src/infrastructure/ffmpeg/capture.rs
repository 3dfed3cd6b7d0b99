//! Whole-disc capture with FFmpeg's libcdio input

use std::path::Path;

use async_trait::async_trait;

use crate::application::ports::{CaptureError, DiscCapture, ProgressCallback};
use crate::application::CancelFlag;
use crate::domain::disc::DiscSource;

use super::{FfmpegRun, FfmpegTools, RunError};

/// Fraction reported while the capture is still running
const RUNNING_PROGRESS_CAP: f64 = 0.99;

/// libcdio may keep reading past the last track; stop this close to the end
const END_MARGIN_SECS: f64 = 1.0;

/// Captures a disc to 16-bit 44.1 kHz stereo WAV
pub struct FfmpegCapture {
    tools: FfmpegTools,
}

impl FfmpegCapture {
    pub fn new(tools: FfmpegTools) -> Self {
        Self { tools }
    }

    fn build_args(source: &DiscSource, destination: &Path, duration_secs: f64) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-f".to_string(),
            "libcdio".to_string(),
            "-i".to_string(),
            source.device(),
            "-t".to_string(),
            format!("{:.3}", duration_secs),
            "-map".to_string(),
            "0:a:0".to_string(),
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

#[async_trait]
impl DiscCapture for FfmpegCapture {
    async fn capture(
        &self,
        source: &DiscSource,
        destination: &Path,
        duration_secs: f64,
        on_progress: Option<ProgressCallback>,
        cancel: &CancelFlag,
    ) -> Result<(), CaptureError> {
        if !(duration_secs.is_finite() && duration_secs > 0.0) {
            return Err(CaptureError::UnknownDuration);
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CaptureError::StartFailed(e.to_string()))?;
        }

        let mut run = FfmpegRun::new(Self::build_args(source, destination, duration_secs))
            .with_progress(Some(duration_secs), on_progress)
            .with_progress_cap(RUNNING_PROGRESS_CAP);
        if duration_secs > END_MARGIN_SECS {
            run = run.stop_at(duration_secs - END_MARGIN_SECS);
        }

        tracing::info!(device = %source.device(), duration_secs, "Starting disc capture");
        let result = self.tools.runner().run(run, cancel).await;

        match result {
            Ok(end) => {
                tracing::debug!(?end, "Capture process finished");
                if tokio::fs::metadata(destination).await.is_err() {
                    return Err(CaptureError::OutputMissing);
                }
                Ok(())
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(destination).await;
                Err(match e {
                    RunError::Cancelled => CaptureError::Cancelled,
                    RunError::NotFound(_) | RunError::StartFailed(_) => {
                        CaptureError::StartFailed(e.to_string())
                    }
                    RunError::Failed(msg) => CaptureError::Failed(msg),
                })
            }
        }
    }
}
