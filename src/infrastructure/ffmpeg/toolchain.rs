//! FFmpeg capability check

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::FfmpegTools;

const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// What the installed FFmpeg can do
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainReport {
    /// `None` if ffmpeg could not be run
    pub ffmpeg_version: Option<String>,
    /// ffprobe runs
    pub ffprobe: bool,
    /// The libcdio demuxer is compiled in
    pub libcdio: bool,
    /// The libmp3lame encoder is compiled in
    pub libmp3lame: bool,
}

impl ToolchainReport {
    pub fn ffmpeg_found(&self) -> bool {
        self.ffmpeg_version.is_some()
    }

    /// Everything a rip needs is present
    pub fn is_ready(&self) -> bool {
        self.ffmpeg_found() && self.ffprobe && self.libcdio && self.libmp3lame
    }
}

/// Probe the configured ffmpeg/ffprobe
pub async fn check_toolchain(tools: &FfmpegTools) -> ToolchainReport {
    let version_output = run_capture(&tools.ffmpeg, &["-version"]).await;
    let ffmpeg_version = version_output.as_deref().and_then(parse_version);

    if ffmpeg_version.is_none() {
        return ToolchainReport {
            ffprobe: run_capture(&tools.ffprobe, &["-version"]).await.is_some(),
            ..ToolchainReport::default()
        };
    }

    let demuxers = run_capture(&tools.ffmpeg, &["-hide_banner", "-demuxers"]).await;
    let encoders = run_capture(&tools.ffmpeg, &["-hide_banner", "-encoders"]).await;

    ToolchainReport {
        ffmpeg_version,
        ffprobe: run_capture(&tools.ffprobe, &["-version"]).await.is_some(),
        libcdio: demuxers.is_some_and(|out| out.contains("libcdio")),
        libmp3lame: encoders.is_some_and(|out| out.contains("libmp3lame")),
    }
}

/// Version token from `ffmpeg -version` output
pub fn parse_version(output: &str) -> Option<String> {
    let first = output.lines().next()?;
    let rest = first.split("version").nth(1)?;
    rest.split_whitespace().next().map(str::to_string)
}

/// Stdout of a successful run, or `None`
async fn run_capture(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(CHECK_TIMEOUT, output).await {
        Ok(Ok(output)) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(Ok(output)) => {
            tracing::debug!(program, status = %output.status, "Tool exited with error");
            None
        }
        Ok(Err(e)) => {
            tracing::debug!(program, error = %e, "Tool could not be started");
            None
        }
        Err(_) => {
            tracing::debug!(program, "Tool timed out");
            None
        }
    }
}
