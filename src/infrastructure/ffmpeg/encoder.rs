//! MP3 encoding with libmp3lame

use std::path::Path;

use async_trait::async_trait;

use crate::application::ports::{AudioEncoder, EncodeError, ProgressCallback};
use crate::application::CancelFlag;
use crate::domain::audio::Bitrate;

use super::probe::probe_duration;
use super::{FfmpegRun, FfmpegTools, RunError};

/// Transcodes linear audio to constant-bitrate MP3
pub struct FfmpegEncoder {
    tools: FfmpegTools,
}

impl FfmpegEncoder {
    pub fn new(tools: FfmpegTools) -> Self {
        Self { tools }
    }

    fn build_args(source: &Path, destination: &Path, bitrate: Bitrate) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            source.to_string_lossy().to_string(),
            "-codec:a".to_string(),
            "libmp3lame".to_string(),
            "-b:a".to_string(),
            bitrate.as_ffmpeg_arg(),
            destination.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl AudioEncoder for FfmpegEncoder {
    async fn encode(
        &self,
        source: &Path,
        destination: &Path,
        bitrate: Bitrate,
        on_progress: Option<ProgressCallback>,
        cancel: &CancelFlag,
    ) -> Result<(), EncodeError> {
        if tokio::fs::metadata(source).await.is_err() {
            return Err(EncodeError::SourceMissing(source.to_path_buf()));
        }
        if cancel.is_cancelled() {
            return Err(EncodeError::Cancelled);
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| EncodeError::StartFailed(e.to_string()))?;
        }

        let duration = match on_progress {
            Some(_) => probe_duration(&self.tools.ffprobe, source).await,
            None => None,
        };

        let run = FfmpegRun::new(Self::build_args(source, destination, bitrate))
            .with_progress(duration, on_progress);

        tracing::debug!(
            source = %source.display(),
            destination = %destination.display(),
            bitrate = bitrate.kbps(),
            "Encoding"
        );

        match self.tools.runner().run(run, cancel).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let _ = tokio::fs::remove_file(destination).await;
                Err(match e {
                    RunError::Cancelled => EncodeError::Cancelled,
                    RunError::NotFound(_) | RunError::StartFailed(_) => {
                        EncodeError::StartFailed(e.to_string())
                    }
                    RunError::Failed(msg) => EncodeError::Failed(msg),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn args_set_codec_and_bitrate() {
        let args = FfmpegEncoder::build_args(
            Path::new("/ws/track_01.wav"),
            Path::new("/out/01 - Opening.mp3"),
            Bitrate::new(128).unwrap(),
        );
        assert!(args.windows(2).any(|w| w == ["-codec:a", "libmp3lame"]));
        assert!(args.windows(2).any(|w| w == ["-b:a", "128k"]));
        assert_eq!(args.last().unwrap(), "/out/01 - Opening.mp3");
    }

    #[tokio::test]
    async fn missing_source_fails_fast() {
        let encoder = FfmpegEncoder::new(FfmpegTools::default());
        let source = PathBuf::from("/nonexistent/track_01.wav");
        let result = encoder
            .encode(
                &source,
                Path::new("/nonexistent/out.mp3"),
                Bitrate::default(),
                None,
                &CancelFlag::new(),
            )
            .await;
        assert!(matches!(result, Err(EncodeError::SourceMissing(p)) if p == source));
    }

    #[tokio::test]
    async fn failed_start_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.wav");
        let destination = dir.path().join("out.mp3");
        std::fs::write(&source, b"RIFF").unwrap();
        std::fs::write(&destination, b"partial").unwrap();

        let tools = FfmpegTools {
            ffmpeg: "definitely-not-ffmpeg-xyz".to_string(),
            ..FfmpegTools::default()
        };
        let result = FfmpegEncoder::new(tools)
            .encode(&source, &destination, Bitrate::default(), None, &CancelFlag::new())
            .await;

        assert!(matches!(result, Err(EncodeError::StartFailed(_))));
        assert!(!destination.exists());
    }
}
