//! Runners for the rip, chapters and check subcommands

use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use crate::application::ports::{ConfigStore, DiscReader};
use crate::application::{PipelineSettings, RipDiscUseCase, RipError, RipOutcome};
use crate::domain::config::AppConfig;
use crate::domain::disc::ChapterTable;
use crate::domain::job::{RipJob, RipMode};
use crate::domain::metadata::{AudiobookMetadata, CoverArt};
use crate::infrastructure::{
    check_toolchain, FfmpegCapture, FfmpegEncoder, FfmpegSplitter, FfmpegTools,
    FfprobeDiscReader, Id3MetadataWriter, XdgConfigStore,
};

use super::args::RipArgs;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;
pub const EXIT_PARTIAL: u8 = 3;

/// Load the config file and layer it between defaults and CLI values
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load_or_empty().await;

    // Merge: defaults < file < cli
    AppConfig::defaults().merge(file_config).merge(cli_config)
}

/// Config values that `rip` flags override
pub fn cli_config(args: &RipArgs) -> AppConfig {
    AppConfig {
        output_directory: args
            .output
            .as_ref()
            .map(|p| p.to_string_lossy().to_string()),
        drive: args.drive.clone(),
        bitrate: args.bitrate.map(|b| b.kbps()),
        combined_filename: args.combined_name.clone(),
        genre: args.genre.clone(),
        artist: args.artist.clone(),
        narrator: args.narrator.clone(),
        encode_workers: args.workers.map(usize::from),
        ..Default::default()
    }
}

/// Run the rip subcommand
pub async fn run_rip(args: RipArgs) -> ExitCode {
    let mut presenter = Presenter::new();
    let config = load_merged_config(cli_config(&args)).await;
    let tools = FfmpegTools::from_config(&config);
    let source = config.drive_or_default();

    let cover = match &args.cover {
        Some(path) => match load_cover(path).await {
            Ok(cover) => Some(cover),
            Err(e) => {
                presenter.error(&e);
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        },
        None => None,
    };

    // The reader caches the table, so the job does not probe the disc twice
    let reader = FfprobeDiscReader::new(tools.clone());
    let chapters = match reader.chapters(&source).await {
        Ok(table) if table.is_empty() => {
            presenter.error(&format!("No tracks found in {}", source));
            return ExitCode::from(EXIT_ERROR);
        }
        Ok(table) => table,
        Err(e) => {
            presenter.error(&format!("Cannot read disc in {}: {}", source, e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let tracks = match &args.tracks {
        Some(selection) => selection.tracks().to_vec(),
        None => chapters.track_numbers(),
    };

    let metadata = build_track_metadata(&args, &config, &chapters, &tracks, cover);
    let mode = if args.combine {
        RipMode::Combined {
            filename: config.combined_filename_or_default().to_string(),
            title: args.combined_title.clone(),
        }
    } else {
        RipMode::Split
    };

    let output_dir = config.output_directory_or_default();
    let job = RipJob::new(source, tracks, &output_dir)
        .with_mode(mode)
        .with_bitrate(config.bitrate_or_default())
        .with_metadata(metadata);

    if let Err(e) = job.validate().and_then(|_| job.validate_against(&chapters)) {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    let use_case = Arc::new(
        RipDiscUseCase::new(
            reader,
            FfmpegCapture::new(tools.clone()),
            FfmpegSplitter::new(tools.clone()),
            FfmpegEncoder::new(tools),
            Id3MetadataWriter::new(),
        )
        .with_settings(PipelineSettings {
            encode_workers: config.encode_workers_or_default(),
            workspace_root: None,
            filename_template: config.filename_template_or_default(),
        }),
    );

    let track_count = job.tracks.len();
    let mut handle = use_case.spawn(job);

    let shutdown = ShutdownSignal::new(handle.cancel_flag());
    if let Err(e) = shutdown.setup() {
        handle.cancel();
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    presenter.info(&format!(
        "Ripping {} track{} to {}",
        track_count,
        if track_count == 1 { "" } else { "s" },
        output_dir.display()
    ));
    presenter.start_progress("Starting");
    while let Some(event) = handle.next_event().await {
        presenter.progress_event(&event);
    }
    presenter.finish_progress();

    let report = handle.wait().await;
    for output in &report.outputs {
        presenter.output(&output.to_string_lossy());
    }

    ExitCode::from(report_exit_code(&report.outcome, &presenter))
}

/// Print the outcome and pick the process exit code
fn report_exit_code(outcome: &RipOutcome, presenter: &Presenter) -> u8 {
    match outcome {
        RipOutcome::Success => {
            presenter.success("Rip complete");
            EXIT_SUCCESS
        }
        RipOutcome::PartialFailure(tracks) => {
            let list = tracks
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            presenter.warn(&format!("Rip finished, tracks failed to encode: {}", list));
            EXIT_PARTIAL
        }
        RipOutcome::Failed(RipError::Input(e)) => {
            presenter.error(&e.to_string());
            EXIT_USAGE_ERROR
        }
        RipOutcome::Failed(e) => {
            presenter.error(&e.to_string());
            EXIT_ERROR
        }
        RipOutcome::Cancelled => {
            presenter.warn("Rip cancelled");
            EXIT_ERROR
        }
    }
}

/// Tag records for the selected tracks.
///
/// Titles come from `--title`, then the disc's chapter titles, then
/// "Track NN".
pub fn build_track_metadata(
    args: &RipArgs,
    config: &AppConfig,
    chapters: &ChapterTable,
    tracks: &[u32],
    cover: Option<CoverArt>,
) -> BTreeMap<u32, AudiobookMetadata> {
    let overrides: BTreeMap<u32, &str> = args
        .titles
        .iter()
        .map(|(track, title)| (*track, title.as_str()))
        .collect();

    tracks
        .iter()
        .map(|&track| {
            let title = overrides
                .get(&track)
                .copied()
                .or_else(|| chapters.title(track))
                .filter(|t| !t.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Track {:02}", track));

            let metadata = AudiobookMetadata {
                title,
                artist: config.artist.clone().unwrap_or_default(),
                album: args.album.clone().unwrap_or_default(),
                track_number: track,
                total_tracks: tracks.len() as u32,
                year: args.year,
                genre: config.genre_or_default().to_string(),
                narrator: config.narrator.clone().unwrap_or_default(),
                series: args.series.clone().unwrap_or_default(),
                series_number: args.series_number.clone().unwrap_or_default(),
                disc_number: args.disc,
                total_discs: args.total_discs,
                cover_art: cover.clone(),
            };
            (track, metadata)
        })
        .collect()
}

async fn load_cover(path: &Path) -> Result<CoverArt, String> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| format!("Cannot read cover image {}: {}", path.display(), e))?;
    let mime = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(CoverArt::mime_for_extension)
        .unwrap_or("image/jpeg");
    Ok(CoverArt::new(data, mime))
}

/// Run the chapters subcommand
pub async fn run_chapters(drive: Option<String>) -> ExitCode {
    let presenter = Presenter::new();
    let config = load_merged_config(AppConfig {
        drive,
        ..Default::default()
    })
    .await;
    let source = config.drive_or_default();
    let reader = FfprobeDiscReader::new(FfmpegTools::from_config(&config));

    match reader.chapters(&source).await {
        Ok(table) if table.is_empty() => {
            presenter.warn(&format!("No tracks found in {}", source));
            ExitCode::from(EXIT_ERROR)
        }
        Ok(table) => {
            presenter.info(&format!("{} tracks in {}", table.len(), source));
            presenter.chapter_table(&table);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&format!("Cannot read disc in {}: {}", source, e));
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the check subcommand
pub async fn run_check() -> ExitCode {
    let presenter = Presenter::new();
    let config = load_merged_config(AppConfig::empty()).await;
    let tools = FfmpegTools::from_config(&config);
    let report = check_toolchain(&tools).await;

    presenter.check_line(
        report.ffmpeg_found(),
        &tools.ffmpeg,
        report.ffmpeg_version.as_deref().unwrap_or("not found"),
    );
    presenter.check_line(
        report.ffprobe,
        &tools.ffprobe,
        if report.ffprobe { "" } else { "not found" },
    );
    presenter.check_line(report.libcdio, "libcdio demuxer (CD input)", "");
    presenter.check_line(report.libmp3lame, "libmp3lame encoder (MP3 output)", "");

    if report.is_ready() {
        presenter.success("Ready to rip");
        ExitCode::from(EXIT_SUCCESS)
    } else {
        presenter.error("FFmpeg is missing features needed to rip audiobooks");
        ExitCode::from(EXIT_ERROR)
    }
}
