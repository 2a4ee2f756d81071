//! The forecast CSV parser/validator and its inverse.
//!
//! # CSV Format
//!
//! ```text
//! date,actual_power,actual_ammonia,is_refill,predicted_ammonia,prediction_error,prediction_error_pct
//! 2025-04-01 00:00:00,1523.5,700,0,690,-10,-1.4285714
//! ```
//!
//! Fields are split on `,` with no quoting or escaping. Blank lines are ignored.

use crate::calendar_day::{CalendarDay, Timestamp};
use crate::error::{ParseError, Result};
use crate::row::{Row, COLUMNS};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{info, warn};
use serde::Serialize;

/// An ordered, validated sequence of rows, ascending by date.
///
/// Produced whole by [`Dataset::parse`] and never edited afterwards; a reload
/// replaces it.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Dataset {
    rows: Vec<Row>,
    /// First backwards pair seen by [`Dataset::parse`] before sorting.
    #[serde(skip)]
    order_violation: Option<OrderViolation>,
}

/// Two adjacent rows whose timestamps run backwards.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderViolation {
    /// 1-based data line of the later (offending) row
    pub line: usize,
    pub previous: Timestamp,
    pub current: Timestamp,
}

impl Dataset {
    /// Build a dataset, stably sorting rows by timestamp.
    pub fn new(mut rows: Vec<Row>) -> Dataset {
        rows.sort_by(Row::cmp_by_date);
        Dataset {
            rows,
            order_violation: None,
        }
    }

    /// Parse and validate forecast CSV text.
    ///
    /// Fail-fast: the first broken rule aborts the parse and no partial
    /// dataset is returned.
    pub fn parse(text: &str) -> Result<Dataset> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.len() < 2 {
            return Err(ParseError::InsufficientData);
        }

        let body = lines.join("\n");
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(Trim::All)
            .from_reader(body.as_bytes());
        let mut records = rdr.records();

        let header = records
            .next()
            .ok_or(ParseError::InsufficientData)?
            .map_err(|e| ParseError::Schema {
                found: e.to_string(),
            })?;
        check_header(&header)?;

        let mut rows = Vec::with_capacity(lines.len() - 1);
        for (idx, result) in records.enumerate() {
            let line = idx + 1;
            let record = result.map_err(|e| ParseError::Format {
                line,
                message: e.to_string(),
            })?;
            rows.push(Row::from_record(&record, line)?);
        }

        let order_violation = find_order_violation(&rows);
        if let Some(violation) = &order_violation {
            warn!(
                "rows are not in ascending date order (line {}: {} > {}); sorting",
                violation.line, violation.previous, violation.current
            );
        }
        let zero_rows = rows.iter().filter(|r| r.expected_error_pct().is_none()).count();
        if zero_rows > 0 {
            warn!(
                "{} row(s) have actual_ammonia = 0; prediction_error_pct check skipped",
                zero_rows
            );
        }
        info!("parsed {} forecast rows", rows.len());
        Ok(Dataset {
            order_violation,
            ..Dataset::new(rows)
        })
    }

    /// Header plus one comma-joined line per row, in dataset order.
    ///
    /// Not a general CSV writer: nothing is quoted.
    pub fn serialize(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(COLUMNS.join(","));
        lines.extend(self.rows.iter().map(Row::to_csv_line));
        lines.join("\n")
    }

    /// Where the input ran backwards, if it did. The rows themselves are
    /// already sorted.
    pub fn order_violation(&self) -> Option<&OrderViolation> {
        self.order_violation.as_ref()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_day(&self) -> Option<CalendarDay> {
        self.rows.first().map(Row::day)
    }

    pub fn last_day(&self) -> Option<CalendarDay> {
        self.rows.last().map(Row::day)
    }

    /// Calendar day of every row, in dataset order (duplicates kept).
    pub fn days(&self) -> impl Iterator<Item = CalendarDay> + '_ {
        self.rows.iter().map(Row::day)
    }

    /// Rows whose percentage consistency check was waived.
    pub fn zero_actual_rows(&self) -> Vec<&Row> {
        self.rows
            .iter()
            .filter(|r| r.expected_error_pct().is_none())
            .collect()
    }
}

fn check_header(header: &StringRecord) -> Result<()> {
    if header.iter().eq(COLUMNS.iter().copied()) {
        Ok(())
    } else {
        Err(ParseError::Schema {
            found: header.iter().collect::<Vec<_>>().join(","),
        })
    }
}

/// First adjacent pair whose earlier row is later than its successor.
pub fn find_order_violation(rows: &[Row]) -> Option<OrderViolation> {
    rows.windows(2).enumerate().find_map(|(idx, pair)| {
        (pair[0].date > pair[1].date).then(|| OrderViolation {
            line: idx + 2,
            previous: pair[0].date,
            current: pair[1].date,
        })
    })
}
