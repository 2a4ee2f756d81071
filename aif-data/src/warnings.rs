//! Refill breach warnings and the advisory anomaly scan.

use crate::window::ClampOutcome;
use aif_core::calendar_day::days_until;
use aif_core::{CalendarDay, Row, Timestamp};
use log::warn;
use serde::Serialize;

/// Default jump (m³) between consecutive rows treated as suspicious.
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 300.0;

/// Refill warning state for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefillWarning {
    /// The requested base date was after the data; breach detection skipped.
    BaseDateBeyondRange { last_day: CalendarDay },
    /// Earliest forecast below the refill level.
    Breach {
        days: i64,
        level: f64,
        date: Timestamp,
    },
    /// The window holds no rows, so nothing was checked.
    NoData,
    Clear,
}

impl RefillWarning {
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            RefillWarning::BaseDateBeyondRange { .. } | RefillWarning::Breach { .. }
        )
    }
}

/// Find the earliest row at or after midnight of `base` whose predicted level
/// is strictly below `refill_level`.
///
/// When the base date had to be clamped past the end of the data, no breach
/// search happens and [`RefillWarning::BaseDateBeyondRange`] is reported. An
/// empty `rows` yields [`RefillWarning::NoData`].
pub fn refill_warning(
    rows: &[Row],
    base: CalendarDay,
    refill_level: f64,
    clamp: ClampOutcome,
) -> RefillWarning {
    if clamp == ClampOutcome::ClampedAfterRangeExceeded {
        return RefillWarning::BaseDateBeyondRange { last_day: base };
    }
    if rows.is_empty() {
        return RefillWarning::NoData;
    }
    let base_ts = base.start();
    rows.iter()
        .filter(|r| r.date >= base_ts)
        .find(|r| r.predicted_ammonia < refill_level)
        .map(|r| RefillWarning::Breach {
            days: days_until(&base_ts, &r.date),
            level: r.predicted_ammonia,
            date: r.date,
        })
        .unwrap_or(RefillWarning::Clear)
}

/// An unflagged jump in actual inventory between two consecutive rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    /// 1-based position of the later row in the dataset
    pub line: usize,
    pub previous_date: Timestamp,
    pub date: Timestamp,
    /// Absolute change in actual ammonia, m³
    pub change: f64,
}

/// Scan consecutive rows by position and flag every jump larger than
/// `threshold` where the later row is not marked as a refill.
///
/// Advisory only: the dataset is never rejected because of a hit.
pub fn anomaly_scan(rows: &[Row], threshold: f64) -> Vec<Anomaly> {
    rows.windows(2)
        .enumerate()
        .filter_map(|(idx, pair)| {
            let (previous, current) = (&pair[0], &pair[1]);
            let change = (current.actual_ammonia - previous.actual_ammonia).abs();
            (!current.is_refill && change > threshold).then(|| Anomaly {
                line: idx + 2,
                previous_date: previous.date,
                date: current.date,
                change,
            })
        })
        .inspect(|a| {
            warn!(
                "row {}: inventory changed {:.1} m³ without a refill flag ({} -> {})",
                a.line, a.change, a.previous_date, a.date
            )
        })
        .collect()
}
