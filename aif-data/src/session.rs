//! User-controlled inputs: refill level, base date selection and month jumps.

use aif_core::{CalendarDay, Dataset};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_REFILL_LEVEL: f64 = 600.0;
pub const REFILL_LEVEL_MIN: f64 = 0.0;
pub const REFILL_LEVEL_MAX: f64 = 1000.0;

/// Threshold (m³) below which inventory needs replenishment, kept in
/// `[REFILL_LEVEL_MIN, REFILL_LEVEL_MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct RefillLevel(f64);

impl RefillLevel {
    pub fn new(value: f64) -> Option<RefillLevel> {
        (REFILL_LEVEL_MIN..=REFILL_LEVEL_MAX)
            .contains(&value)
            .then_some(RefillLevel(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Step the level by `delta`. A step that would leave the valid range is
    /// ignored. Returns whether the level changed.
    pub fn adjust(&mut self, delta: f64) -> bool {
        match RefillLevel::new(self.0 + delta) {
            Some(next) if next != *self => {
                *self = next;
                true
            }
            _ => false,
        }
    }
}

impl Default for RefillLevel {
    fn default() -> Self {
        RefillLevel(DEFAULT_REFILL_LEVEL)
    }
}

/// Starting base date for a freshly loaded dataset: `today` if some row falls
/// on it, else the latest row day before it, else the median row day.
pub fn initial_base_date(dataset: &Dataset, today: CalendarDay) -> Option<CalendarDay> {
    let mut days: Vec<CalendarDay> = dataset.days().collect();
    days.sort();
    if days.binary_search(&today).is_ok() {
        return Some(today);
    }
    let past = days.partition_point(|d| *d <= today);
    if past > 0 {
        return Some(days[past - 1]);
    }
    days.get(days.len() / 2).copied()
}

/// A calendar month present in the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// "YYYY-MM"
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Short label "YY/MM"
    pub fn label(&self) -> String {
        format!("{:02}/{:02}", self.year.rem_euclid(100), self.month)
    }

    /// The base date a month jump lands on.
    pub fn first_day(&self) -> Option<CalendarDay> {
        CalendarDay::from_ymd_opt(self.year, self.month, 1)
    }
}

impl From<CalendarDay> for YearMonth {
    fn from(value: CalendarDay) -> Self {
        YearMonth {
            year: value.year(),
            month: value.month(),
        }
    }
}

/// Distinct months covered by the dataset, ascending.
pub fn month_index(dataset: &Dataset) -> Vec<YearMonth> {
    dataset
        .days()
        .map(YearMonth::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{day, daily, row};

    #[test]
    fn refill_level_rejects_out_of_range() {
        assert!(RefillLevel::new(-1.0).is_none());
        assert!(RefillLevel::new(1000.5).is_none());
        assert_eq!(RefillLevel::new(1000.0).unwrap().value(), 1000.0);
        assert_eq!(RefillLevel::default().value(), 600.0);
    }

    #[test]
    fn adjust_ignores_steps_past_bounds() {
        let mut level = RefillLevel::new(990.0).unwrap();
        assert!(level.adjust(10.0));
        assert_eq!(level.value(), 1000.0);
        assert!(!level.adjust(10.0));
        assert_eq!(level.value(), 1000.0);

        let mut level = RefillLevel::new(5.0).unwrap();
        assert!(!level.adjust(-10.0));
        assert_eq!(level.value(), 5.0);
    }

    #[test]
    fn initial_base_prefers_today() {
        let dataset = daily(&[(700.0, 700.0); 10]);
        assert_eq!(
            initial_base_date(&dataset, day(2025, 6, 4)),
            Some(day(2025, 6, 4))
        );
    }

    #[test]
    fn initial_base_falls_back_to_latest_past_day() {
        let dataset = Dataset::new(vec![
            row("2025-06-01 00:00:00", 700.0, 700.0, false),
            row("2025-06-05 00:00:00", 690.0, 690.0, false),
            row("2025-06-09 00:00:00", 680.0, 680.0, false),
        ]);
        assert_eq!(
            initial_base_date(&dataset, day(2025, 6, 7)),
            Some(day(2025, 6, 5))
        );
        assert_eq!(
            initial_base_date(&dataset, day(2026, 1, 1)),
            Some(day(2025, 6, 9))
        );
    }

    #[test]
    fn initial_base_uses_median_when_data_is_all_future() {
        let dataset = daily(&[(700.0, 700.0); 5]);
        assert_eq!(
            initial_base_date(&dataset, day(2020, 1, 1)),
            Some(day(2025, 6, 3))
        );
        assert_eq!(initial_base_date(&Dataset::default(), day(2020, 1, 1)), None);
    }

    #[test]
    fn month_index_is_distinct_and_sorted() {
        let dataset = daily(&[(700.0, 700.0); 45]);
        let months = month_index(&dataset);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].key(), "2025-06");
        assert_eq!(months[1].label(), "25/07");
        assert_eq!(months[1].first_day(), Some(day(2025, 7, 1)));
    }
}
