/// Error types for the forecast CSV validator
use thiserror::Error;

use crate::row::COLUMNS;

/// Validation failure raised by [`crate::dataset::Dataset::parse`].
///
/// The first violated rule aborts the whole parse. `line` is the 1-based
/// data line number: the header is not counted and blank lines are skipped.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Fewer than a header line and one data line
    #[error("CSV has insufficient data: a header line and at least one data line are required")]
    InsufficientData,

    /// Header does not match the seven-column schema
    #[error("invalid header, expected: {}", COLUMNS.join(", "))]
    Schema { found: String },

    /// Wrong column count or malformed date
    #[error("line {line}: {message}")]
    Format { line: usize, message: String },

    /// A numeric field is missing, non-numeric or not finite
    #[error("line {line}: {field} is not a finite number ({value:?})")]
    Numeric {
        line: usize,
        field: &'static str,
        value: String,
    },

    /// `is_refill` is not the literal `0` or `1`
    #[error("line {line}: is_refill must be 0 or 1 ({value:?})")]
    Enum { line: usize, value: String },

    /// An ammonia level outside `[0, 1200]`
    #[error("line {line}: {field} must be within {min}-{max} ({value})")]
    Range {
        line: usize,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A stored error field disagrees with the value derived from the row
    #[error("line {line}: {field} is inconsistent (expected: {expected:.4}, actual: {found})")]
    Consistency {
        line: usize,
        field: &'static str,
        expected: f64,
        found: f64,
    },
}

/// Type alias for Results using ParseError
pub type Result<T> = std::result::Result<T, ParseError>;

impl ParseError {
    /// Name of the taxonomy class this error belongs to.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::InsufficientData => "InsufficientData",
            ParseError::Schema { .. } => "SchemaError",
            ParseError::Format { .. } => "FormatError",
            ParseError::Numeric { .. } => "NumericError",
            ParseError::Enum { .. } => "EnumError",
            ParseError::Range { .. } => "RangeError",
            ParseError::Consistency { .. } => "ConsistencyError",
        }
    }

    /// Data line the error points at, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Format { line, .. }
            | ParseError::Numeric { line, .. }
            | ParseError::Enum { line, .. }
            | ParseError::Range { line, .. }
            | ParseError::Consistency { line, .. } => Some(*line),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ParseError;

    #[test]
    fn schema_error_names_every_column() {
        let message = ParseError::Schema {
            found: "date".to_string(),
        }
        .to_string();
        assert_eq!(
            message,
            "invalid header, expected: date, actual_power, actual_ammonia, is_refill, \
             predicted_ammonia, prediction_error, prediction_error_pct"
        );
    }

    #[test]
    fn line_is_reported_for_row_errors_only() {
        let err = ParseError::Enum {
            line: 3,
            value: "2".to_string(),
        };
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.kind(), "EnumError");
        assert_eq!(ParseError::InsufficientData.line(), None);
        assert_eq!(ParseError::Schema { found: String::new() }.line(), None);
    }

    #[test]
    fn reader_failures_are_format_errors_with_a_line() {
        let err = ParseError::Format {
            line: 5,
            message: "unreadable record".to_string(),
        };
        assert_eq!(err.kind(), "FormatError");
        assert_eq!(err.line(), Some(5));
    }
}
