use crate::calendar_day::{self, CalendarDay, Timestamp, TIMESTAMP_FORMAT};
use crate::error::{ParseError, Result};
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Column names of the forecast CSV, in order.
pub const COLUMNS: [&str; 7] = [
    "date",
    "actual_power",
    "actual_ammonia",
    "is_refill",
    "predicted_ammonia",
    "prediction_error",
    "prediction_error_pct",
];

/// Expected number of columns in a forecast CSV row.
pub const CSV_ROW_LENGTH: usize = COLUMNS.len();

/// Valid ammonia levels in m³, inclusive on both ends.
pub const AMMONIA_MIN: f64 = 0.0;
pub const AMMONIA_MAX: f64 = 1200.0;

/// Allowed drift between `prediction_error` and `predicted - actual` (m³).
pub const ERROR_TOLERANCE: f64 = 0.01;

/// Allowed drift between `prediction_error_pct` and `error / actual * 100` (%).
pub const ERROR_PCT_TOLERANCE: f64 = 0.1;

/// One daily observation: measured inventory next to the model's forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub date: Timestamp,
    /// kW
    pub actual_power: f64,
    /// m³
    pub actual_ammonia: f64,
    pub is_refill: bool,
    /// m³
    pub predicted_ammonia: f64,
    pub prediction_error: f64,
    pub prediction_error_pct: f64,
}

impl Row {
    /// Build a row from one data record, checking the per-row rules in order:
    /// date shape, numeric fields, refill flag, ammonia ranges, then the two
    /// cross-field consistency rules.
    pub fn from_record(record: &StringRecord, line: usize) -> Result<Row> {
        if record.len() != CSV_ROW_LENGTH {
            return Err(ParseError::Format {
                line,
                message: format!(
                    "expected {} columns, found {}",
                    CSV_ROW_LENGTH,
                    record.len()
                ),
            });
        }
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let date = calendar_day::parse_strict(field(0)).ok_or_else(|| ParseError::Format {
            line,
            message: format!(
                "invalid date {:?} (expected YYYY-MM-DD HH:MM:SS)",
                field(0)
            ),
        })?;

        let actual_power = parse_number(field(1), COLUMNS[1], line)?;
        let actual_ammonia = parse_number(field(2), COLUMNS[2], line)?;
        let predicted_ammonia = parse_number(field(4), COLUMNS[4], line)?;
        let prediction_error = parse_number(field(5), COLUMNS[5], line)?;
        let prediction_error_pct = parse_number(field(6), COLUMNS[6], line)?;

        let is_refill = match field(3) {
            "0" => false,
            "1" => true,
            other => {
                return Err(ParseError::Enum {
                    line,
                    value: other.to_string(),
                })
            }
        };

        check_range(actual_ammonia, COLUMNS[2], line)?;
        check_range(predicted_ammonia, COLUMNS[4], line)?;

        let row = Row {
            date,
            actual_power,
            actual_ammonia,
            is_refill,
            predicted_ammonia,
            prediction_error,
            prediction_error_pct,
        };
        row.check_consistency(line)?;
        Ok(row)
    }

    fn check_consistency(&self, line: usize) -> Result<()> {
        let expected_error = self.predicted_ammonia - self.actual_ammonia;
        if (self.prediction_error - expected_error).abs() > ERROR_TOLERANCE {
            return Err(ParseError::Consistency {
                line,
                field: COLUMNS[5],
                expected: expected_error,
                found: self.prediction_error,
            });
        }
        if let Some(expected_pct) = self.expected_error_pct() {
            if (self.prediction_error_pct - expected_pct).abs() > ERROR_PCT_TOLERANCE {
                return Err(ParseError::Consistency {
                    line,
                    field: COLUMNS[6],
                    expected: expected_pct,
                    found: self.prediction_error_pct,
                });
            }
        }
        Ok(())
    }

    /// `prediction_error / actual_ammonia * 100`, or `None` when the actual
    /// level is zero and the percentage rule is waived.
    pub fn expected_error_pct(&self) -> Option<f64> {
        if self.actual_ammonia == 0.0 {
            return None;
        }
        Some(self.prediction_error / self.actual_ammonia * 100.0)
    }

    pub fn day(&self) -> CalendarDay {
        CalendarDay::of(&self.date)
    }

    /// Comma-joined fields in column order, without quoting.
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{}",
            self.date.format(TIMESTAMP_FORMAT),
            self.actual_power,
            self.actual_ammonia,
            if self.is_refill { "1" } else { "0" },
            self.predicted_ammonia,
            self.prediction_error,
            self.prediction_error_pct
        )
    }

    /// Orders rows by timestamp only.
    pub fn cmp_by_date(&self, other: &Row) -> Ordering {
        self.date.cmp(&other.date)
    }
}

fn parse_number(value: &str, field: &'static str, line: usize) -> Result<f64> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError::Numeric {
            line,
            field,
            value: value.to_string(),
        }),
    }
}

fn check_range(value: f64, field: &'static str, line: usize) -> Result<()> {
    if (AMMONIA_MIN..=AMMONIA_MAX).contains(&value) {
        Ok(())
    } else {
        Err(ParseError::Range {
            line,
            field,
            value,
            min: AMMONIA_MIN,
            max: AMMONIA_MAX,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    const VALID: [&str; 7] = [
        "2025-04-01 00:00:00",
        "1523.5",
        "700",
        "0",
        "690",
        "-10",
        "-1.4285714",
    ];

    fn with(idx: usize, value: &'static str) -> StringRecord {
        let mut fields = VALID;
        fields[idx] = value;
        record(&fields)
    }

    #[test]
    fn valid_record_becomes_typed_row() {
        let row = Row::from_record(&record(&VALID), 1).unwrap();
        assert_eq!(row.actual_ammonia, 700.0);
        assert_eq!(row.predicted_ammonia, 690.0);
        assert!(!row.is_refill);
        assert_eq!(row.day().to_string(), "2025-04-01");
    }

    #[test]
    fn column_count_is_a_format_error() {
        let err = Row::from_record(&record(&VALID[..6]), 4).unwrap_err();
        assert!(matches!(err, ParseError::Format { line: 4, .. }));
    }

    #[test]
    fn rules_fire_in_order() {
        // bad date wins over a bad number on the same row
        let mut fields = VALID;
        fields[0] = "2025/04/01";
        fields[1] = "abc";
        let err = Row::from_record(&record(&fields), 2).unwrap_err();
        assert_eq!(err.kind(), "FormatError");

        let err = Row::from_record(&with(1, "NaN"), 2).unwrap_err();
        assert!(matches!(err, ParseError::Numeric { field: "actual_power", .. }));

        let err = Row::from_record(&with(3, "true"), 2).unwrap_err();
        assert!(matches!(err, ParseError::Enum { .. }));

        let err = Row::from_record(&with(2, "1200.5"), 2).unwrap_err();
        assert!(matches!(err, ParseError::Range { field: "actual_ammonia", .. }));
    }

    #[test]
    fn ammonia_range_includes_both_ends() {
        let full = [
            "2025-04-01 00:00:00",
            "1500",
            "1200",
            "0",
            "1200",
            "0",
            "0",
        ];
        let row = Row::from_record(&record(&full), 1).unwrap();
        assert_eq!(row.actual_ammonia, 1200.0);
        assert_eq!(row.predicted_ammonia, 1200.0);

        let empty = [
            "2025-04-01 00:00:00",
            "1500",
            "700",
            "0",
            "0",
            "-700",
            "-100",
        ];
        let row = Row::from_record(&record(&empty), 1).unwrap();
        assert_eq!(row.predicted_ammonia, 0.0);
    }

    #[test]
    fn negative_prediction_is_a_range_error() {
        let mut fields = VALID;
        fields[4] = "-0.01";
        fields[5] = "-700.01";
        fields[6] = "-100.0014";
        let err = Row::from_record(&record(&fields), 3).unwrap_err();
        match err {
            ParseError::Range {
                line, field, value, ..
            } => {
                assert_eq!(line, 3);
                assert_eq!(field, "predicted_ammonia");
                assert_eq!(value, -0.01);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn numeric_check_covers_every_field_before_ranges() {
        let err = Row::from_record(&with(6, "abc"), 1).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Numeric { field: "prediction_error_pct", .. }
        ));

        // a non-numeric last field wins over an out-of-range level
        let mut fields = VALID;
        fields[2] = "1300";
        fields[6] = "abc";
        let err = Row::from_record(&record(&fields), 1).unwrap_err();
        assert_eq!(err.kind(), "NumericError");
    }

    #[test]
    fn infinite_values_are_numeric_errors() {
        let err = Row::from_record(&with(5, "inf"), 1).unwrap_err();
        assert!(matches!(err, ParseError::Numeric { field: "prediction_error", .. }));
    }

    #[test]
    fn prediction_error_must_match_difference() {
        let err = Row::from_record(&with(5, "-10.02"), 7).unwrap_err();
        match err {
            ParseError::Consistency {
                line,
                field,
                expected,
                ..
            } => {
                assert_eq!(line, 7);
                assert_eq!(field, "prediction_error");
                assert_eq!(expected, -10.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn percentage_rule_is_waived_at_zero_actual() {
        let fields = [
            "2025-04-01 00:00:00",
            "0",
            "0",
            "1",
            "15",
            "15",
            "999",
        ];
        let row = Row::from_record(&record(&fields), 1).unwrap();
        assert_eq!(row.expected_error_pct(), None);

        let err = Row::from_record(&with(6, "-1.6"), 1).unwrap_err();
        assert!(matches!(err, ParseError::Consistency { field: "prediction_error_pct", .. }));
    }

    #[test]
    fn csv_line_keeps_column_order() {
        let row = Row::from_record(&record(&VALID), 1).unwrap();
        assert_eq!(
            row.to_csv_line(),
            "2025-04-01 00:00:00,1523.5,700,0,690,-10,-1.4285714"
        );
    }
}
