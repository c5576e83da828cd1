//! Stage timings for the crop pipeline.
//!
//! Every timing is written to the [`TELEMETRY_TARGET`] log target when a
//! [`StageTimer`] is dropped. Timers are inert until [`configure`] switches
//! telemetry on, and a stage is only timed when its level is within the
//! configured threshold.

use std::{
    fmt::Display,
    sync::atomic::{AtomicUsize, Ordering},
    time::Instant,
};

use log::{Level, LevelFilter, log, log_enabled};

/// Log target used for every timing entry.
pub const TELEMETRY_TARGET: &str = "eyeline::telemetry";

/// Highest level that is timed, as `LevelFilter as usize`. Zero when telemetry is off.
static THRESHOLD: AtomicUsize = AtomicUsize::new(LevelFilter::Off as usize);

/// Pipeline stages that can be timed, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// A whole batch run.
    Batch,
    /// One input file: decode, frame, encode.
    Item,
    /// Face selection, planning and resampling for one image.
    Frame,
    Locate,
    Resample,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Batch => "batch",
            Stage::Item => "item",
            Stage::Frame => "frame",
            Stage::Locate => "locate",
            Stage::Resample => "resample",
        }
    }

    /// Level the stage logs at; finer stages need a more verbose threshold.
    pub fn level(self) -> Level {
        match self {
            Stage::Batch => Level::Info,
            Stage::Item | Stage::Frame => Level::Debug,
            Stage::Locate | Stage::Resample => Level::Trace,
        }
    }
}

/// Switch telemetry on or off and set the most verbose level that is timed.
pub fn configure(enabled: bool, level: LevelFilter) {
    let threshold = if enabled { level } else { LevelFilter::Off };
    THRESHOLD.store(threshold as usize, Ordering::Relaxed);
}

/// Returns `true` when `stage` falls within the configured threshold.
pub fn stage_enabled(stage: Stage) -> bool {
    stage.level() as usize <= THRESHOLD.load(Ordering::Relaxed)
}

/// Logs the duration of a stage when dropped.
#[derive(Debug)]
pub struct StageTimer {
    stage: Stage,
    detail: Option<String>,
    fallback: bool,
    /// `None` when the timer will not log.
    started: Option<Instant>,
}

impl StageTimer {
    pub fn is_active(&self) -> bool {
        self.started.is_some()
    }

    /// Attach a detail (usually a file name) to the log line.
    pub fn with_detail(mut self, detail: impl Display) -> Self {
        if self.is_active() {
            self.detail = Some(detail.to_string());
        }
        self
    }

    /// Tag the log line so fallback crops can be told apart from regular ones.
    pub fn mark_fallback(&mut self) {
        self.fallback = true;
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        let Some(started) = self.started else {
            return;
        };
        let elapsed = started.elapsed();
        let tag = if self.fallback { " [fallback]" } else { "" };
        match self.detail.as_deref() {
            Some(detail) => log!(
                target: TELEMETRY_TARGET,
                self.stage.level(),
                "{} {detail}{tag} took {elapsed:.2?}",
                self.stage.label()
            ),
            None => log!(
                target: TELEMETRY_TARGET,
                self.stage.level(),
                "{}{tag} took {elapsed:.2?}",
                self.stage.label()
            ),
        }
    }
}

/// Start timing `stage`. The timer is inert unless telemetry and the logger both
/// accept the stage's level.
pub fn time_stage(stage: Stage) -> StageTimer {
    let level = stage.level();
    let active = stage_enabled(stage) && log_enabled!(target: TELEMETRY_TARGET, level);
    StageTimer {
        stage,
        detail: None,
        fallback: false,
        started: active.then(Instant::now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_selects_stages() {
        configure(true, LevelFilter::Debug);
        assert!(stage_enabled(Stage::Batch));
        assert!(stage_enabled(Stage::Item));
        assert!(stage_enabled(Stage::Frame));
        assert!(!stage_enabled(Stage::Resample));

        configure(true, LevelFilter::Trace);
        assert!(stage_enabled(Stage::Locate));

        configure(false, LevelFilter::Trace);
        assert!(!stage_enabled(Stage::Batch));
        let mut timer = time_stage(Stage::Batch).with_detail("ignored");
        timer.mark_fallback();
        assert!(!timer.is_active());
        assert!(timer.detail.is_none());
    }

    #[test]
    fn stage_levels_get_finer() {
        let stages = [
            Stage::Batch,
            Stage::Item,
            Stage::Frame,
            Stage::Locate,
            Stage::Resample,
        ];
        for pair in stages.windows(2) {
            assert!(pair[0].level() <= pair[1].level(), "{pair:?}");
        }
        assert_eq!(Stage::Resample.label(), "resample");
    }
}
