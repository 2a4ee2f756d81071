//! Core types for the ammonia inventory forecast dashboard.
//!
//! - [`row`]: one daily observation and its per-row validation rules
//! - [`dataset`]: the CSV parser/validator and its serializing inverse
//! - [`calendar_day`]: the fixed UTC+9 date resolver
//! - [`error`]: the fail-fast validation error taxonomy

pub mod calendar_day;
pub mod dataset;
pub mod error;
pub mod row;

pub use calendar_day::{CalendarDay, Timestamp};
pub use dataset::Dataset;
pub use error::ParseError;
pub use row::Row;
