//! The one recomputation entry point: `(dataset, base date, refill level)`
//! in, a complete derived view out.
//!
//! Any input change reruns [`analyze`] wholesale, so a view is never a mix of
//! old and new state.

use crate::session::RefillLevel;
use crate::statistics::WindowStatistics;
use crate::warnings::{anomaly_scan, refill_warning, Anomaly, RefillWarning};
use crate::window::{window, ClampOutcome};
use aif_core::{CalendarDay, Dataset, Row, Timestamp};
use serde::Serialize;

/// Everything the presentation layer needs for one render.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView<'a> {
    /// Base date after clamping.
    pub base: CalendarDay,
    pub requested_base: CalendarDay,
    pub clamp: ClampOutcome,
    pub refill_level: f64,
    pub radius_days: i64,
    pub window_start: Timestamp,
    pub window_end: Timestamp,
    pub rows: &'a [Row],
    /// `None` when the window is empty.
    pub statistics: Option<WindowStatistics>,
    pub refill_warning: RefillWarning,
    pub anomalies: Vec<Anomaly>,
}

/// Pipeline knobs that are configuration rather than user input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    pub radius_days: i64,
    pub anomaly_threshold: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            radius_days: crate::window::DEFAULT_WINDOW_RADIUS_DAYS,
            anomaly_threshold: crate::warnings::DEFAULT_ANOMALY_THRESHOLD,
        }
    }
}

/// Window the dataset around `base`, then derive statistics and warnings
/// from that window.
pub fn analyze<'a>(
    dataset: &'a Dataset,
    base: CalendarDay,
    refill_level: RefillLevel,
    options: AnalysisOptions,
) -> DashboardView<'a> {
    let selected = window(dataset, base, options.radius_days);
    let level = refill_level.value();
    let statistics = WindowStatistics::compute(&selected, level);
    let warning = refill_warning(selected.rows, selected.base, level, selected.clamp);
    log::debug!(
        "analyzed {} (requested {}): {} rows, warning={}",
        selected.base,
        base,
        selected.rows.len(),
        warning.is_warning()
    );
    DashboardView {
        base: selected.base,
        requested_base: base,
        clamp: selected.clamp,
        refill_level: level,
        radius_days: selected.radius_days,
        window_start: selected.start(),
        window_end: selected.end(),
        rows: selected.rows,
        statistics,
        refill_warning: warning,
        anomalies: anomaly_scan(dataset.rows(), options.anomaly_threshold),
    }
}
