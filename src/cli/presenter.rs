//! CLI presenter for output formatting

use std::path::Path;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::disc::{format_clock, ChapterTable};
use crate::domain::job::{RipProgress, RipStatus};

/// Resolution of the job progress bar
const BAR_LENGTH: u64 = 1000;

/// Presenter for CLI output formatting
pub struct Presenter {
    bar: Option<ProgressBar>,
    last_status: Option<RipStatus>,
    /// Error line waiting for the next event; see `event_lines`
    held_error: Option<String>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self {
            bar: None,
            last_status: None,
            held_error: None,
        }
    }

    /// Start the job progress bar
    pub fn start_progress(&mut self, message: &str) {
        let bar = ProgressBar::new(BAR_LENGTH);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {percent:>3}% {msg}")
            .map(|s| s.progress_chars("█▓░"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(std::time::Duration::from_millis(120));
        self.bar = Some(bar);
        self.last_status = None;
        self.held_error = None;
    }

    /// Render one job event
    pub fn progress_event(&mut self, event: &RipProgress) {
        let lines = self.event_lines(event);
        let Some(bar) = &self.bar else {
            return;
        };

        let position = (event.overall_progress() * BAR_LENGTH as f64).round() as u64;
        if position > bar.position() {
            bar.set_position(position.min(BAR_LENGTH));
        }

        for line in lines {
            bar.println(line);
        }

        if event.status().is_stage() && self.last_status != Some(event.status()) {
            bar.set_message(status_message(event));
            self.last_status = Some(event.status());
        }
    }

    /// Lines to print above the bar for `event`.
    ///
    /// An error is held until another event arrives: only then is it known
    /// to be a track failure. An error that ends the stream is the job's
    /// outcome, which the caller reports.
    fn event_lines(&mut self, event: &RipProgress) -> Vec<String> {
        let mut lines: Vec<String> = self.held_error.take().into_iter().collect();
        match event.status() {
            RipStatus::Encoded if event.total_tracks() > 1 => {
                lines.push(format!(
                    "{} Track {} encoded{}",
                    "✓".green(),
                    event.track(),
                    file_suffix(event.current_file())
                ));
            }
            RipStatus::Error => {
                self.held_error = event.error().map(|e| format!("{} {}", "✗".red(), e));
            }
            RipStatus::Warning => {
                if let Some(error) = event.error() {
                    lines.push(format!("{} Track {}: {}", "⚠".yellow(), event.track(), error));
                }
            }
            _ => {}
        }
        lines
    }

    /// Stop the bar, leaving the final state on screen
    pub fn finish_progress(&mut self) {
        self.held_error = None;
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Print a check result line
    pub fn check_line(&self, ok: bool, label: &str, detail: &str) {
        let mark = if ok { "✓".green() } else { "✗".red() };
        if detail.is_empty() {
            println!("{} {}", mark, label);
        } else {
            println!("{} {} {}", mark, label, detail.dimmed());
        }
    }

    /// Print the disc layout
    pub fn chapter_table(&self, table: &ChapterTable) {
        for line in format_chapter_lines(table) {
            println!("{}", line);
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

fn file_suffix(path: Option<&Path>) -> String {
    path.and_then(|p| p.file_name())
        .map(|name| format!(" → {}", name.to_string_lossy()))
        .unwrap_or_default()
}

/// Bar message for a stage
pub fn status_message(event: &RipProgress) -> String {
    match event.status() {
        RipStatus::Capturing => "Reading disc".to_string(),
        RipStatus::Splitting => "Splitting tracks".to_string(),
        RipStatus::Encoding | RipStatus::Encoded if event.total_tracks() > 1 => {
            format!("Encoding {} tracks", event.total_tracks())
        }
        RipStatus::Encoding | RipStatus::Encoded => "Encoding".to_string(),
        RipStatus::WritingMetadata => "Writing tags".to_string(),
        other => other.to_string(),
    }
}

/// One line per track: number, start, length, title
pub fn format_chapter_lines(table: &ChapterTable) -> Vec<String> {
    table
        .track_numbers()
        .into_iter()
        .filter_map(|track| {
            let range = table.range(track)?;
            Some(format!(
                "{:>3}  {:>8}  {:>8}  {}",
                track,
                format_clock(range.start()),
                format_clock(range.duration()),
                table.title(track).unwrap_or("")
            ))
        })
        .collect()
}
