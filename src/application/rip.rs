//! Rip disc use case
//!
//! Sequences capture, optional splitting, encoding and tagging for one
//! job, reports progress as [`RipProgress`] events and cleans up the
//! job's workspace on every exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::domain::config::DEFAULT_ENCODE_WORKERS;
use crate::domain::disc::{ChapterTable, TimeRange};
use crate::domain::error::InputError;
use crate::domain::job::{RipJob, RipMode, RipProgress, RipStatus};
use crate::domain::metadata::{AudiobookMetadata, FilenameTemplate};

use super::cancel::CancelFlag;
use super::encode_pool::{EncodePool, EncodeWork};
use super::ports::{
    AudioEncoder, CaptureError, DiscCapture, DiscReader, EncodeError, MetadataWriter, SplitError,
    TrackSplitter,
};
use super::progress::{CombinedPlan, ProgressReporter, SplitPlan, StageRange};
use super::workspace::Workspace;

/// File name of the whole-disc capture inside the workspace
const CAPTURE_FILE: &str = "full_disc.wav";

/// Errors that end a job
#[derive(Debug, Clone, Error)]
pub enum RipError {
    #[error("Invalid job: {0}")]
    Input(#[from] InputError),

    #[error("Capture failed: {0}")]
    Capture(CaptureError),

    #[error("Splitting failed: {0}")]
    Split(SplitError),

    #[error("Encoding failed: {0}")]
    Encode(EncodeError),

    #[error("Cannot create output directory: {0}")]
    OutputDirectory(String),

    #[error("Cannot create workspace: {0}")]
    Workspace(String),

    #[error("Job task stopped unexpectedly: {0}")]
    Aborted(String),

    #[error("Job was cancelled")]
    Cancelled,
}

impl From<CaptureError> for RipError {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::Cancelled => Self::Cancelled,
            other => Self::Capture(other),
        }
    }
}

impl From<SplitError> for RipError {
    fn from(e: SplitError) -> Self {
        match e {
            SplitError::Cancelled => Self::Cancelled,
            other => Self::Split(other),
        }
    }
}

impl From<EncodeError> for RipError {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::Cancelled => Self::Cancelled,
            other => Self::Encode(other),
        }
    }
}

/// Terminal result of a job
#[derive(Debug, Clone)]
pub enum RipOutcome {
    Success,
    /// Finished, but these tracks failed to encode
    PartialFailure(Vec<u32>),
    Failed(RipError),
    Cancelled,
}

impl RipOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn failed_tracks(&self) -> &[u32] {
        match self {
            Self::PartialFailure(tracks) => tracks,
            _ => &[],
        }
    }
}

/// What a finished job hands back
#[derive(Debug, Clone)]
pub struct RipReport {
    pub outcome: RipOutcome,
    /// Finished files in the destination directory
    pub outputs: Vec<PathBuf>,
}

/// Knobs that are not part of a job
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Parallel encoders in split mode
    pub encode_workers: usize,
    /// Parent of the workspace directory; system temp dir if `None`
    pub workspace_root: Option<PathBuf>,
    /// Per-track output file naming
    pub filename_template: FilenameTemplate,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            encode_workers: DEFAULT_ENCODE_WORKERS,
            workspace_root: None,
            filename_template: FilenameTemplate::default(),
        }
    }
}

/// A running job
pub struct RipHandle {
    events: UnboundedReceiver<RipProgress>,
    cancel: CancelFlag,
    task: JoinHandle<RipReport>,
}

impl RipHandle {
    /// Next progress event; `None` once the job has finished
    pub async fn next_event(&mut self) -> Option<RipProgress> {
        self.events.recv().await
    }

    /// Ask the job to stop. Idempotent.
    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }

    /// Flag shared with the job, for signal handlers
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Wait for the terminal report
    pub async fn wait(self) -> RipReport {
        match self.task.await {
            Ok(report) => report,
            Err(e) => RipReport {
                outcome: RipOutcome::Failed(RipError::Aborted(e.to_string())),
                outputs: Vec::new(),
            },
        }
    }
}

/// Accumulated results of the stages that ran
#[derive(Debug, Default)]
struct JobState {
    outputs: Vec<PathBuf>,
    failed: Vec<u32>,
}

/// Pipeline orchestrator for one disc
pub struct RipDiscUseCase<R, C, S, E, M>
where
    R: DiscReader,
    C: DiscCapture,
    S: TrackSplitter,
    E: AudioEncoder + 'static,
    M: MetadataWriter,
{
    reader: R,
    capture: C,
    splitter: S,
    encoder: Arc<E>,
    metadata: M,
    settings: PipelineSettings,
}

impl<R, C, S, E, M> RipDiscUseCase<R, C, S, E, M>
where
    R: DiscReader,
    C: DiscCapture,
    S: TrackSplitter,
    E: AudioEncoder + 'static,
    M: MetadataWriter,
{
    /// Create a new use case instance
    pub fn new(reader: R, capture: C, splitter: S, encoder: E, metadata: M) -> Self {
        Self {
            reader,
            capture,
            splitter,
            encoder: Arc::new(encoder),
            metadata,
            settings: PipelineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Run `job` to completion.
    ///
    /// Events go to `events`; the last one carries `complete`, `error` or
    /// `cancelled` and is sent after the workspace has been removed.
    pub async fn execute(
        &self,
        job: RipJob,
        events: UnboundedSender<RipProgress>,
        cancel: CancelFlag,
    ) -> RipReport {
        let reporter = ProgressReporter::new(events, job.reporting_units());
        let mut state = JobState::default();

        tracing::info!(
            source = %job.source,
            tracks = ?job.tracks,
            combined = job.mode.is_combined(),
            bitrate = job.bitrate.kbps(),
            "Starting rip job"
        );

        let result = self.run(&job, &reporter, &cancel, &mut state).await;

        let outcome = match result {
            Ok(()) if state.failed.is_empty() => RipOutcome::Success,
            Ok(()) => {
                let mut failed = state.failed;
                failed.sort_unstable();
                RipOutcome::PartialFailure(failed)
            }
            Err(RipError::Cancelled) => RipOutcome::Cancelled,
            Err(e) => RipOutcome::Failed(e),
        };

        emit_terminal(&reporter, &outcome);
        tracing::info!(outcome = ?outcome, outputs = state.outputs.len(), "Rip job finished");

        RipReport {
            outcome,
            outputs: state.outputs,
        }
    }

    async fn run(
        &self,
        job: &RipJob,
        reporter: &ProgressReporter,
        cancel: &CancelFlag,
        state: &mut JobState,
    ) -> Result<(), RipError> {
        job.validate()?;
        checkpoint(cancel)?;

        let chapters = self.read_chapters(job).await?;
        job.validate_against(&chapters)?;
        checkpoint(cancel)?;

        tokio::fs::create_dir_all(job.output_dir())
            .await
            .map_err(|e| RipError::OutputDirectory(format!("{}: {}", job.output_dir().display(), e)))?;

        let workspace = Workspace::create(self.settings.workspace_root.as_deref())
            .map_err(|e| RipError::Workspace(e.to_string()))?;

        let result = match (&job.mode, job.combined_output()) {
            (RipMode::Combined { title, .. }, Some(output)) => {
                self.run_combined(job, &chapters, &workspace, output, title.as_deref(), reporter, cancel, state)
                    .await
            }
            _ => {
                self.run_split(job, &chapters, &workspace, reporter, cancel, state)
                    .await
            }
        };

        workspace.close();
        result
    }

    /// Fetch the chapter table once; it fixes the capture duration
    async fn read_chapters(&self, job: &RipJob) -> Result<ChapterTable, RipError> {
        let chapters = self
            .reader
            .chapters(&job.source)
            .await
            .map_err(CaptureError::from)?;

        if chapters.is_empty() || chapters.total_duration() <= 0.0 {
            return Err(CaptureError::UnknownDuration.into());
        }

        tracing::debug!(
            tracks = chapters.len(),
            duration = chapters.total_duration(),
            "Read chapter table"
        );
        Ok(chapters)
    }

    /// Capture the whole disc into the workspace
    async fn capture_disc(
        &self,
        job: &RipJob,
        chapters: &ChapterTable,
        workspace: &Workspace,
        stage: StageRange,
        reporter: &ProgressReporter,
        cancel: &CancelFlag,
    ) -> Result<PathBuf, RipError> {
        let capture_path = workspace.file(CAPTURE_FILE);
        tracing::info!(duration = chapters.total_duration(), "Capturing disc");

        reporter.emit(reporter.at(stage.low, RipStatus::Capturing).with_file(&capture_path));
        let on_progress =
            reporter.stage_callback(stage, RipStatus::Capturing, Some(capture_path.clone()));
        self.capture
            .capture(
                &job.source,
                &capture_path,
                chapters.total_duration(),
                Some(on_progress),
                cancel,
            )
            .await?;
        reporter.emit(reporter.at(stage.high, RipStatus::Capturing).with_file(&capture_path));

        Ok(capture_path)
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_combined(
        &self,
        job: &RipJob,
        chapters: &ChapterTable,
        workspace: &Workspace,
        output: PathBuf,
        title: Option<&str>,
        reporter: &ProgressReporter,
        cancel: &CancelFlag,
        state: &mut JobState,
    ) -> Result<(), RipError> {
        let plan = CombinedPlan::WEIGHTS;

        let capture_path = self
            .capture_disc(job, chapters, workspace, plan.capture, reporter, cancel)
            .await?;
        checkpoint(cancel)?;

        tracing::info!(output = %output.display(), "Encoding combined file");
        reporter.emit(reporter.at(plan.encode.low, RipStatus::Encoding).with_file(&output));
        let on_progress = reporter.stage_callback(plan.encode, RipStatus::Encoding, Some(output.clone()));
        self.encoder
            .encode(&capture_path, &output, job.bitrate, Some(on_progress), cancel)
            .await?;
        workspace.discard(&capture_path).await;
        state.outputs.push(output.clone());
        reporter.emit(reporter.at(plan.encode.high, RipStatus::Encoded).with_file(&output));
        checkpoint(cancel)?;

        reporter.emit(
            reporter
                .at(plan.metadata.low, RipStatus::WritingMetadata)
                .with_file(&output),
        );
        let first = job.tracks.first().copied().unwrap_or(1);
        let metadata = job.metadata_for(first).for_combined_file(title);
        self.write_tags(&output, &metadata, first, reporter).await;
        reporter.emit(
            reporter
                .at(plan.metadata.high, RipStatus::WritingMetadata)
                .with_file(&output),
        );

        Ok(())
    }

    async fn run_split(
        &self,
        job: &RipJob,
        chapters: &ChapterTable,
        workspace: &Workspace,
        reporter: &ProgressReporter,
        cancel: &CancelFlag,
        state: &mut JobState,
    ) -> Result<(), RipError> {
        let plan = SplitPlan::WEIGHTS;

        let capture_path = self
            .capture_disc(job, chapters, workspace, plan.capture, reporter, cancel)
            .await?;
        checkpoint(cancel)?;

        // Splitting
        let ranges: Vec<TimeRange> = job
            .tracks
            .iter()
            .filter_map(|&track| chapters.range(track))
            .collect();
        tracing::info!(ranges = ranges.len(), "Splitting capture into tracks");

        reporter.emit(reporter.at(plan.split.low, RipStatus::Splitting).with_file(&capture_path));
        let on_progress =
            reporter.stage_callback(plan.split, RipStatus::Splitting, Some(capture_path.clone()));
        let split_files = self
            .splitter
            .split(&capture_path, workspace.path(), &ranges, Some(on_progress), cancel)
            .await?;
        workspace.discard(&capture_path).await;

        if split_files.len() != ranges.len() {
            return Err(RipError::Split(SplitError::RangeFailed {
                ordinal: split_files.len() + 1,
                message: format!(
                    "splitter produced {} files for {} ranges",
                    split_files.len(),
                    ranges.len()
                ),
            }));
        }
        reporter.emit(reporter.at(plan.split.high, RipStatus::Splitting));
        checkpoint(cancel)?;

        // Parallel encode
        let encoded = self
            .encode_tracks(job, split_files, plan.encode, reporter, cancel, state)
            .await;
        checkpoint(cancel)?;

        // Metadata
        reporter.emit(reporter.at(plan.metadata.low, RipStatus::WritingMetadata));
        let count = encoded.len();
        for (i, (track, path)) in encoded.iter().enumerate() {
            checkpoint(cancel)?;
            let metadata = self.track_metadata(job, *track);
            let overall = plan.metadata.remap((i + 1) as f64 / count as f64);
            reporter.emit(
                reporter
                    .at(overall, RipStatus::WritingMetadata)
                    .with_track(*track)
                    .with_file(path),
            );
            self.write_tags(path, &metadata, *track, reporter).await;
        }
        reporter.emit(reporter.at(plan.metadata.high, RipStatus::WritingMetadata));

        Ok(())
    }

    /// Encode the split files through the worker pool.
    ///
    /// Returns the tracks that encoded cleanly, in job order. Failed
    /// tracks are recorded in `state`; encodes stopped by cancellation are
    /// neither.
    async fn encode_tracks(
        &self,
        job: &RipJob,
        split_files: Vec<PathBuf>,
        stage: StageRange,
        reporter: &ProgressReporter,
        cancel: &CancelFlag,
        state: &mut JobState,
    ) -> Vec<(u32, PathBuf)> {
        let items: Vec<EncodeWork> = job
            .tracks
            .iter()
            .zip(split_files)
            .map(|(&track, source)| EncodeWork {
                track,
                source,
                destination: self.track_output(job, track),
            })
            .collect();
        let total = items.len();
        let mut pending: Vec<u32> = items.iter().map(|w| w.track).collect();

        reporter.emit(reporter.at(stage.low, RipStatus::Encoding));

        let pool = EncodePool::new(Arc::clone(&self.encoder), self.settings.encode_workers);
        let mut results = pool.run(items, job.bitrate, cancel.clone());

        let mut completed = 0usize;
        let mut encoded = Vec::with_capacity(total);
        while let Some(result) = results.recv().await {
            pending.retain(|&t| t != result.track);
            if result.was_cancelled() {
                tracing::debug!(track = result.track, "Encode stopped by cancellation");
                continue;
            }

            completed += 1;
            let overall = stage.remap(completed as f64 / total as f64);

            match result.error {
                None => {
                    tracing::info!(track = result.track, output = %result.output.display(), "Track encoded");
                    reporter.emit(
                        reporter
                            .at(overall, RipStatus::Encoded)
                            .with_track(result.track)
                            .with_file(&result.output),
                    );
                    state.outputs.push(result.output.clone());
                    encoded.push((result.track, result.output));
                }
                Some(e) => {
                    tracing::warn!(track = result.track, error = %e, "Track failed to encode");
                    reporter.emit(
                        reporter
                            .at(overall, RipStatus::Error)
                            .with_track(result.track)
                            .with_file(&result.output)
                            .with_error(format!("Track {}: {}", result.track, e)),
                    );
                    state.failed.push(result.track);
                }
            }
        }

        // Without a cancel every submitted track must be accounted for
        if !cancel.is_cancelled() {
            for track in pending {
                tracing::warn!(track, "Track produced no encode result");
                state.failed.push(track);
            }
        }

        let position = |track: u32| job.tracks.iter().position(|&t| t == track);
        encoded.sort_by_key(|(track, _)| position(*track));
        encoded
    }

    /// Metadata for one split track, with the job's track count as total
    fn track_metadata(&self, job: &RipJob, track: u32) -> AudiobookMetadata {
        let mut metadata = job.metadata_for(track);
        if metadata.total_tracks == 0 {
            metadata.total_tracks = job.tracks.len() as u32;
        }
        metadata
    }

    /// Destination of one split track
    fn track_output(&self, job: &RipJob, track: u32) -> PathBuf {
        let metadata = job.metadata_for(track);
        job.output_dir()
            .join(self.settings.filename_template.render(track, &metadata))
    }

    /// Write tags; a failure becomes a warning event
    async fn write_tags(
        &self,
        path: &Path,
        metadata: &AudiobookMetadata,
        track: u32,
        reporter: &ProgressReporter,
    ) {
        if let Err(e) = self.metadata.write(path, metadata).await {
            tracing::warn!(file = %path.display(), error = %e, "Metadata write failed");
            reporter.emit(
                reporter
                    .here(RipStatus::Warning)
                    .with_track(track)
                    .with_file(path)
                    .with_error(format!("Metadata write failed: {}", e)),
            );
        }
    }
}

impl<R, C, S, E, M> RipDiscUseCase<R, C, S, E, M>
where
    R: DiscReader + 'static,
    C: DiscCapture + 'static,
    S: TrackSplitter + 'static,
    E: AudioEncoder + 'static,
    M: MetadataWriter + 'static,
{
    /// Run `job` on a background task
    pub fn spawn(self: &Arc<Self>, job: RipJob) -> RipHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancelFlag::new();

        let this = Arc::clone(self);
        let flag = cancel.clone();
        let task = tokio::spawn(async move { this.execute(job, tx, flag).await });

        RipHandle {
            events: rx,
            cancel,
            task,
        }
    }
}

fn checkpoint(cancel: &CancelFlag) -> Result<(), RipError> {
    if cancel.is_cancelled() {
        Err(RipError::Cancelled)
    } else {
        Ok(())
    }
}

fn emit_terminal(reporter: &ProgressReporter, outcome: &RipOutcome) {
    let event = match outcome {
        RipOutcome::Success => reporter.at(1.0, RipStatus::Complete),
        RipOutcome::PartialFailure(tracks) => {
            let list = tracks
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            reporter
                .at(1.0, RipStatus::Complete)
                .with_error(format!("Tracks failed to encode: {}", list))
        }
        RipOutcome::Failed(e) => reporter.here(RipStatus::Error).with_error(e.to_string()),
        RipOutcome::Cancelled => reporter.here(RipStatus::Cancelled),
    };
    reporter.emit(event);
}
