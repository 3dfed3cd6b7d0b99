//! FFmpeg subprocess runner
//!
//! Runs one ffmpeg invocation with `-progress pipe:1`, turns the reported
//! output time into a fraction, and stops the child on cancellation:
//! a polite signal first, then a kill once the grace period is over.

use std::collections::VecDeque;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

use crate::application::ports::ProgressCallback;
use crate::application::CancelFlag;

/// Lines of stderr kept for error messages
const STDERR_TAIL_LINES: usize = 20;

/// Arguments placed before every invocation
const COMMON_ARGS: &[&str] = &[
    "-hide_banner",
    "-nostdin",
    "-loglevel",
    "error",
    "-progress",
    "pipe:1",
    "-nostats",
];

/// Runner errors, mapped by each adapter into its port error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    NotFound(String),
    StartFailed(String),
    Failed(String),
    Cancelled,
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(program) => write!(f, "{} not found. Please install FFmpeg.", program),
            Self::StartFailed(msg) => write!(f, "failed to start: {}", msg),
            Self::Failed(msg) => write!(f, "{}", msg),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// How a successful run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// The process exited with status 0
    Exited,
    /// The runner stopped the process at `stop_at_secs`
    StoppedAtLimit,
}

/// One ffmpeg invocation
pub struct FfmpegRun {
    pub args: Vec<String>,
    /// Expected output duration, for progress fractions
    pub duration_secs: Option<f64>,
    pub on_progress: Option<ProgressCallback>,
    /// Upper bound for fractions reported while the process runs
    pub progress_cap: f64,
    /// Stop the process once this much output has been written
    pub stop_at_secs: Option<f64>,
}

impl FfmpegRun {
    pub fn new(args: Vec<String>) -> Self {
        Self {
            args,
            duration_secs: None,
            on_progress: None,
            progress_cap: 1.0,
            stop_at_secs: None,
        }
    }

    pub fn with_progress(mut self, duration_secs: Option<f64>, on_progress: Option<ProgressCallback>) -> Self {
        self.duration_secs = duration_secs.filter(|d| *d > 0.0);
        self.on_progress = on_progress;
        self
    }

    pub fn with_progress_cap(mut self, cap: f64) -> Self {
        self.progress_cap = cap.clamp(0.0, 1.0);
        self
    }

    pub fn stop_at(mut self, secs: f64) -> Self {
        self.stop_at_secs = Some(secs);
        self
    }

    fn report(&self, seconds: f64) {
        if let (Some(cb), Some(total)) = (&self.on_progress, self.duration_secs) {
            cb((seconds / total).clamp(0.0, 1.0).min(self.progress_cap));
        }
    }

    fn finish(&self) {
        if let Some(cb) = &self.on_progress {
            cb(1.0);
        }
    }
}

/// Spawns ffmpeg and supervises it
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    program: String,
    grace: Duration,
}

impl FfmpegRunner {
    pub fn new(program: impl Into<String>, grace: Duration) -> Self {
        Self {
            program: program.into(),
            grace,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run to completion, cancellation, or the stop limit
    pub async fn run(&self, run: FfmpegRun, cancel: &CancelFlag) -> Result<RunEnd, RunError> {
        let mut args: Vec<String> = COMMON_ARGS.iter().map(|s| s.to_string()).collect();
        args.extend(run.args.iter().cloned());
        tracing::debug!(program = %self.program, args = ?args, "Spawning ffmpeg");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RunError::NotFound(self.program.clone())
                } else {
                    RunError::StartFailed(e.to_string())
                }
            })?;

        let stderr_tail = child.stderr.take().map(|stderr| tokio::spawn(collect_tail(stderr)));

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        self.terminate(&mut child).await;
                        return Err(RunError::Cancelled);
                    }
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => {
                            let Some(seconds) = parse_progress_line(&line) else {
                                continue;
                            };
                            run.report(seconds);
                            if run.stop_at_secs.is_some_and(|limit| seconds >= limit) {
                                tracing::debug!(seconds, "Reached stop limit, stopping ffmpeg");
                                self.terminate(&mut child).await;
                                run.finish();
                                return Ok(RunEnd::StoppedAtLimit);
                            }
                        }
                        Ok(None) | Err(_) => break,
                    }
                }
            }
        }

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.terminate(&mut child).await;
                return Err(RunError::Cancelled);
            }
            status = child.wait() => status.map_err(|e| RunError::Failed(e.to_string()))?,
        };

        if status.success() {
            run.finish();
            return Ok(RunEnd::Exited);
        }

        let tail = match stderr_tail {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };
        let message = if tail.is_empty() {
            format!("{} exited with {}", self.program, status)
        } else {
            format!("{} exited with {}: {}", self.program, status, tail)
        };
        Err(RunError::Failed(message))
    }

    /// Ask the child to exit, then kill it after the grace period
    async fn terminate(&self, child: &mut Child) {
        request_stop(child);
        match tokio::time::timeout(self.grace, child.wait()).await {
            Ok(_) => {}
            Err(_) => {
                tracing::warn!(
                    program = %self.program,
                    grace_secs = self.grace.as_secs_f64(),
                    "Process did not exit within grace period, killing"
                );
                let _ = child.kill().await;
            }
        }
    }
}

#[cfg(unix)]
fn request_stop(child: &mut Child) {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    if let Some(id) = child.id() {
        let _ = signal::kill(Pid::from_raw(id as i32), Signal::SIGTERM);
    }
}

#[cfg(not(unix))]
fn request_stop(child: &mut Child) {
    let _ = child.start_kill();
}

async fn collect_tail<R: AsyncRead + Unpin>(stream: R) -> String {
    let mut lines = BufReader::new(stream).lines();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    tail.into_iter().collect::<Vec<_>>().join("\n")
}

/// Output time in seconds from one `-progress` line.
///
/// `out_time_ms` carries microseconds despite its name.
pub fn parse_progress_line(line: &str) -> Option<f64> {
    let (key, value) = line.split_once('=')?;
    let value = value.trim();
    match key.trim() {
        "out_time_us" | "out_time_ms" => value
            .parse::<i64>()
            .ok()
            .filter(|us| *us >= 0)
            .map(|us| us as f64 / 1_000_000.0),
        "out_time" => parse_clock(value),
        _ => None,
    }
}

/// Parse `HH:MM:SS.ffffff`
pub fn parse_clock(value: &str) -> Option<f64> {
    let mut parts = value.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    Some((hours * 3600 + minutes * 60) as f64 + seconds)
}
