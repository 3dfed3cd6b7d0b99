//! Progress aggregation
//!
//! Stages report a native fraction in `[0, 1]`. The aggregator maps it into
//! the stage's slice of the job-wide figure and turns that figure into
//! [`RipProgress`] events.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::UnboundedSender;

use crate::domain::job::{RipProgress, RipStatus};

use super::ports::ProgressCallback;

/// The slice `[low, high]` of overall progress owned by one stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageRange {
    pub low: f64,
    pub high: f64,
}

impl StageRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Map a native fraction into this range
    pub fn remap(&self, fraction: f64) -> f64 {
        remap(self.low, self.high, fraction)
    }
}

/// `low + f * (high - low)`, clamped to `[low, high]`.
/// A NaN fraction maps to `low`.
pub fn remap(low: f64, high: f64, fraction: f64) -> f64 {
    let f = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    (low + f * (high - low)).clamp(low, high)
}

/// Stage weights for a combined rip. Adjacent stages share their boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombinedPlan {
    pub capture: StageRange,
    pub encode: StageRange,
    pub metadata: StageRange,
}

impl CombinedPlan {
    pub const WEIGHTS: CombinedPlan = CombinedPlan {
        capture: StageRange::new(0.0, 0.5),
        encode: StageRange::new(0.5, 0.95),
        metadata: StageRange::new(0.95, 1.0),
    };
}

/// Stage weights for a per-track rip. Adjacent stages share their boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPlan {
    pub capture: StageRange,
    pub split: StageRange,
    pub encode: StageRange,
    pub metadata: StageRange,
}

impl SplitPlan {
    pub const WEIGHTS: SplitPlan = SplitPlan {
        capture: StageRange::new(0.0, 0.4),
        split: StageRange::new(0.4, 0.5),
        encode: StageRange::new(0.5, 0.95),
        metadata: StageRange::new(0.95, 1.0),
    };
}

/// Emits progress events for one job.
///
/// Holds a high-water mark so the overall figure carried by events never
/// decreases, even when a port reports a smaller fraction than before.
/// Cheap to clone; clones share the mark and the channel.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    sender: UnboundedSender<RipProgress>,
    total_units: u32,
    high_water: Arc<Mutex<f64>>,
}

impl ProgressReporter {
    pub fn new(sender: UnboundedSender<RipProgress>, total_units: u32) -> Self {
        Self {
            sender,
            total_units: total_units.max(1),
            high_water: Arc::new(Mutex::new(0.0)),
        }
    }

    /// Current overall figure
    pub fn current(&self) -> f64 {
        *self.lock()
    }

    /// Build an event at `overall`, raising the high-water mark
    pub fn at(&self, overall: f64, status: RipStatus) -> RipProgress {
        let value = {
            let mut mark = self.lock();
            if overall > *mark {
                *mark = overall.min(1.0);
            }
            *mark
        };
        RipProgress::from_overall(value, self.total_units, status)
    }

    /// Build an event at the current figure without advancing it
    pub fn here(&self, status: RipStatus) -> RipProgress {
        RipProgress::from_overall(self.current(), self.total_units, status)
    }

    /// Deliver an event. A closed receiver is ignored.
    pub fn emit(&self, event: RipProgress) {
        tracing::trace!(
            status = %event.status(),
            overall = event.overall_progress(),
            track = event.track(),
            "progress"
        );
        let _ = self.sender.send(event);
    }

    /// Callback for a port: remaps its native fraction into `stage` and
    /// emits one event per tick.
    pub fn stage_callback(
        &self,
        stage: StageRange,
        status: RipStatus,
        file: Option<PathBuf>,
    ) -> ProgressCallback {
        let reporter = self.clone();
        Arc::new(move |fraction: f64| {
            let mut event = reporter.at(stage.remap(fraction), status);
            if let Some(path) = &file {
                event = event.with_file(path.clone());
            }
            reporter.emit(event);
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, f64> {
        self.high_water
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
