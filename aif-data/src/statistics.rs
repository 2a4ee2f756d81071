//! Window statistics: current stock, R², average error and next refill.
//!
//! Each function recomputes from the rows it is given; nothing is cached.

use crate::window::Window;
use aif_core::calendar_day::days_until;
use aif_core::{CalendarDay, Row, Timestamp};
use serde::Serialize;

/// Where the next refill falls relative to the base date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextRefill {
    /// First future row predicted at or below the refill level.
    BelowRefillLevel { date: Timestamp, days: i64 },
    /// No predicted breach; first future row flagged as a refill.
    ScheduledRefill { date: Timestamp, days: i64 },
    /// Future rows exist but none qualify.
    NoneWithinHorizon,
    /// No row lies after the base date.
    NoForecastData,
}

impl NextRefill {
    pub fn date(&self) -> Option<Timestamp> {
        match self {
            NextRefill::BelowRefillLevel { date, .. } | NextRefill::ScheduledRefill { date, .. } => {
                Some(*date)
            }
            _ => None,
        }
    }

    pub fn days(&self) -> Option<i64> {
        match self {
            NextRefill::BelowRefillLevel { days, .. } | NextRefill::ScheduledRefill { days, .. } => {
                Some(*days)
            }
            _ => None,
        }
    }
}

/// Statistics for one non-empty window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowStatistics {
    /// `None` when the base day has no row.
    pub current_stock: Option<f64>,
    /// R² of predicted against actual ammonia.
    pub accuracy: f64,
    /// Mean absolute stored prediction error, m³.
    pub avg_error: f64,
    pub next_refill: NextRefill,
}

impl WindowStatistics {
    /// `None` for an empty window: no statistics are computable.
    pub fn compute(window: &Window<'_>, refill_level: f64) -> Option<WindowStatistics> {
        let avg_error = avg_error(window.rows)?;
        Some(WindowStatistics {
            current_stock: current_stock(window.rows, window.base),
            accuracy: accuracy(window.rows),
            avg_error,
            next_refill: next_refill(window.rows, window.base, refill_level),
        })
    }
}

/// Actual ammonia on the base day. No interpolation across missing days.
pub fn current_stock(rows: &[Row], base: CalendarDay) -> Option<f64> {
    rows.iter()
        .find(|r| r.day() == base)
        .map(|r| r.actual_ammonia)
}

/// Coefficient of determination `1 - SSres / SStot` over every row.
///
/// Returns `0` for an empty slice and for a constant actual series
/// (`SStot == 0`), where R² is otherwise undefined.
pub fn accuracy(rows: &[Row]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let mean = rows.iter().map(|r| r.actual_ammonia).sum::<f64>() / rows.len() as f64;
    let ss_tot: f64 = rows
        .iter()
        .map(|r| (r.actual_ammonia - mean).powi(2))
        .sum();
    let ss_res: f64 = rows
        .iter()
        .map(|r| (r.actual_ammonia - r.predicted_ammonia).powi(2))
        .sum();
    if ss_tot == 0.0 {
        0.0
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// Mean of `|prediction_error|` as stored, not recomputed.
pub fn avg_error(rows: &[Row]) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }
    Some(rows.iter().map(|r| r.prediction_error.abs()).sum::<f64>() / rows.len() as f64)
}

/// First row strictly after midnight of `base` predicted at or below
/// `refill_level`, falling back to the first future row flagged as a refill.
pub fn next_refill(rows: &[Row], base: CalendarDay, refill_level: f64) -> NextRefill {
    let base_ts = base.start();
    let future: Vec<&Row> = rows.iter().filter(|r| r.date > base_ts).collect();
    if future.is_empty() {
        return NextRefill::NoForecastData;
    }
    if let Some(r) = future.iter().find(|r| r.predicted_ammonia <= refill_level) {
        return NextRefill::BelowRefillLevel {
            date: r.date,
            days: days_until(&base_ts, &r.date),
        };
    }
    match future.iter().find(|r| r.is_refill) {
        Some(r) => NextRefill::ScheduledRefill {
            date: r.date,
            days: days_until(&base_ts, &r.date),
        },
        None => NextRefill::NoneWithinHorizon,
    }
}
