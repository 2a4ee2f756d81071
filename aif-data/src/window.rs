//! Date-bounded selection of rows around a base date.

use aif_core::{CalendarDay, Dataset, Row, Timestamp};
use chrono::TimeDelta;
use serde::Serialize;

/// Days shown on each side of the base date by default.
pub const DEFAULT_WINDOW_RADIUS_DAYS: i64 = 30;

/// Radius cap; wider requests are treated as this wide.
pub const MAX_WINDOW_RADIUS_DAYS: i64 = 36_500;

/// How the requested base date related to the dataset's range.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize)]
pub enum ClampOutcome {
    InRange,
    /// Base date was before the first row's day; moved to that day.
    ClampedBefore,
    /// Base date was after the last row's day; moved to that day.
    ClampedAfterRangeExceeded,
}

/// The rows within `radius_days` of the (clamped) base date.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    pub base: CalendarDay,
    pub clamp: ClampOutcome,
    pub radius_days: i64,
    pub rows: &'a [Row],
}

impl Window<'_> {
    /// Lower timestamp bound, inclusive.
    pub fn start(&self) -> Timestamp {
        self.base.start() - radius(self.radius_days)
    }

    /// Upper timestamp bound, inclusive.
    pub fn end(&self) -> Timestamp {
        self.base.start() + radius(self.radius_days)
    }

    /// No rows fell inside the bounds; nothing can be computed.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn radius(days: i64) -> TimeDelta {
    TimeDelta::days(days.clamp(-MAX_WINDOW_RADIUS_DAYS, MAX_WINDOW_RADIUS_DAYS))
}

/// Clamp `base` into the dataset's day range, then select every row whose
/// full timestamp lies in `[base - radius_days, base + radius_days]`.
///
/// Clamping compares calendar days; the filter compares timestamps from
/// midnight of the base day. A row at 12:00 on the last day of the span is
/// therefore outside it.
pub fn window(dataset: &Dataset, base: CalendarDay, radius_days: i64) -> Window<'_> {
    let (base, clamp) = clamp(dataset, base);
    let mut selected = Window {
        base,
        clamp,
        radius_days,
        rows: &[],
    };
    let (start, end) = (selected.start(), selected.end());
    let rows = dataset.rows();
    // rows are ascending, so the span is contiguous
    let lo = rows.partition_point(|r| r.date < start);
    let hi = rows.partition_point(|r| r.date <= end);
    if lo < hi {
        selected.rows = &rows[lo..hi];
    }
    log::debug!(
        "window around {} ({:?}): {} rows",
        selected.base,
        selected.clamp,
        selected.rows.len()
    );
    selected
}

/// Clamp a requested base day into `[first day, last day]` of the dataset.
pub fn clamp(dataset: &Dataset, base: CalendarDay) -> (CalendarDay, ClampOutcome) {
    match (dataset.first_day(), dataset.last_day()) {
        (Some(first), _) if base < first => (first, ClampOutcome::ClampedBefore),
        (_, Some(last)) if base > last => (last, ClampOutcome::ClampedAfterRangeExceeded),
        _ => (base, ClampOutcome::InRange),
    }
}
