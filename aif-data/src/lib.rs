//! Derived views over a validated forecast dataset.
//!
//! Everything here is pure: the same `(dataset, base date, refill level)`
//! always yields the same window, statistics and warnings.

pub mod dashboard;
pub mod session;
pub mod statistics;
pub mod warnings;
pub mod window;

#[cfg(test)]
pub(crate) mod test_support {
    use aif_core::calendar_day::parse_strict;
    use aif_core::{CalendarDay, Dataset, Row};

    pub fn day(y: i32, m: u32, d: u32) -> CalendarDay {
        CalendarDay::from_ymd_opt(y, m, d).unwrap()
    }

    /// Build a row with consistent error fields.
    pub fn row(date: &str, actual: f64, predicted: f64, is_refill: bool) -> Row {
        let error = predicted - actual;
        Row {
            date: parse_strict(date).unwrap(),
            actual_power: 1500.0,
            actual_ammonia: actual,
            is_refill,
            predicted_ammonia: predicted,
            prediction_error: error,
            prediction_error_pct: if actual == 0.0 { 0.0 } else { error / actual * 100.0 },
        }
    }

    /// Consecutive days at midnight starting 2025-06-01, one row per
    /// `(actual, predicted)` pair.
    pub fn daily(values: &[(f64, f64)]) -> Dataset {
        let start = day(2025, 6, 1);
        Dataset::new(
            values
                .iter()
                .enumerate()
                .map(|(i, (actual, predicted))| {
                    let date = start.shift(i as i64).unwrap();
                    row(&format!("{date} 00:00:00"), *actual, *predicted, false)
                })
                .collect(),
        )
    }
}
