use chrono::{
    DateTime, Datelike, FixedOffset, IsoWeek, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta,
    TimeZone, Utc, Weekday,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Offset every forecast timestamp is interpreted in: UTC+9, no daylight saving.
pub const OFFSET_SECONDS: i32 = 9 * 3600;

/// Strict write-path date format: "YYYY-MM-DD HH:MM:SS"
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date format used for calendar days: "YYYY-MM-DD"
pub const DAY_FORMAT: &str = "%Y-%m-%d";

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// A timestamp anchored to the fixed forecast offset.
pub type Timestamp = DateTime<FixedOffset>;

const OFFSET: FixedOffset = match FixedOffset::east_opt(OFFSET_SECONDS) {
    Some(offset) => offset,
    None => panic!("OFFSET_SECONDS is within a day"),
};

/// The fixed UTC+9 offset.
pub fn offset() -> FixedOffset {
    OFFSET
}

/// Checks `value` against a shape where `d` stands for one ASCII digit and
/// every other character must match literally.
fn matches_shape(value: &str, shape: &str) -> bool {
    value.len() == shape.len()
        && value
            .bytes()
            .zip(shape.bytes())
            .all(|(v, s)| if s == b'd' { v.is_ascii_digit() } else { v == s })
}

fn anchor(naive: NaiveDateTime) -> Option<Timestamp> {
    offset().from_local_datetime(&naive).single()
}

/// Parse the import format `YYYY-MM-DD HH:MM:SS` and nothing else.
///
/// The shape is checked before chrono sees the string, since chrono accepts
/// single-digit months and days.
pub fn parse_strict(value: &str) -> Option<Timestamp> {
    if !matches_shape(value, "dddd-dd-dd dd:dd:dd") {
        return None;
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .ok()
        .and_then(anchor)
}

/// Parse any date shape the display path accepts.
///
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD` are read in the
/// fixed offset. Anything else falls back to RFC 3339 / RFC 2822, which carry
/// their own offset.
pub fn parse_timestamp(value: &str) -> Option<Timestamp> {
    let value = value.trim();
    if matches_shape(value, "dddd-dd-dd dd:dd:dd") {
        return parse_strict(value);
    }
    if matches_shape(value, "dddd-dd-ddTdd:dd:dd") {
        return NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .and_then(anchor);
    }
    if matches_shape(value, "dddd-dd-dd") {
        return NaiveDate::parse_from_str(value, DAY_FORMAT)
            .ok()
            .map(CalendarDay)
            .map(|day| day.start());
    }
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .ok()
}

/// Resolve a date string of any accepted shape to its calendar day.
pub fn to_calendar_day(value: &str) -> Option<CalendarDay> {
    parse_timestamp(value).map(|ts| CalendarDay::of(&ts))
}

/// Current wall-clock time shifted into the fixed offset.
pub fn now() -> Timestamp {
    Utc::now().with_timezone(&offset())
}

/// Today's calendar day in the fixed offset.
pub fn today() -> CalendarDay {
    CalendarDay::of(&now())
}

/// Whole days from `base` to `ts`, rounded up: `ceil((ts - base) / 1 day)`.
pub fn days_until(base: &Timestamp, ts: &Timestamp) -> i64 {
    let millis = (*ts - *base).num_milliseconds();
    (millis as f64 / MILLIS_PER_DAY).ceil() as i64
}

/// A date with time-of-day discarded, compared as a year-month-day triplet
/// in the fixed UTC+9 offset.
#[derive(
    Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Copy, Clone, Serialize, Deserialize,
)]
#[serde(into = "String", try_from = "String")]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    pub fn from_ymd_opt(year: i32, month: u32, day: u32) -> Option<CalendarDay> {
        NaiveDate::from_ymd_opt(year, month, day).map(CalendarDay)
    }

    /// Calendar day of a timestamp, after shifting it into the fixed offset.
    pub fn of(ts: &Timestamp) -> CalendarDay {
        CalendarDay(ts.with_timezone(&offset()).date_naive())
    }

    /// Midnight of this day in the fixed offset.
    pub fn start(&self) -> Timestamp {
        let midnight = self.0.and_time(NaiveTime::MIN);
        offset()
            .from_local_datetime(&midnight)
            .single()
            .unwrap_or_else(|| offset().from_utc_datetime(&midnight))
    }

    pub fn as_naive_date(&self) -> NaiveDate {
        self.0
    }

    /// Move by `days` (negative moves back). `None` past chrono's range.
    pub fn shift(&self, days: i64) -> Option<CalendarDay> {
        TimeDelta::try_days(days)
            .and_then(|delta| self.0.checked_add_signed(delta))
            .map(CalendarDay)
    }

    fn map_to_option_self(sub_result: Option<NaiveDate>) -> Option<Self> {
        sub_result.map(CalendarDay)
    }
}

impl Datelike for CalendarDay {
    fn year(&self) -> i32 {
        self.0.year()
    }
    fn month(&self) -> u32 {
        self.0.month()
    }
    fn month0(&self) -> u32 {
        self.0.month0()
    }
    fn day(&self) -> u32 {
        self.0.day()
    }
    fn day0(&self) -> u32 {
        self.0.day0()
    }
    fn ordinal(&self) -> u32 {
        self.0.ordinal()
    }
    fn ordinal0(&self) -> u32 {
        self.0.ordinal0()
    }
    fn weekday(&self) -> Weekday {
        self.0.weekday()
    }
    fn iso_week(&self) -> IsoWeek {
        self.0.iso_week()
    }
    fn with_year(&self, year: i32) -> Option<Self> {
        CalendarDay::map_to_option_self(self.0.with_year(year))
    }
    fn with_month(&self, month: u32) -> Option<Self> {
        CalendarDay::map_to_option_self(self.0.with_month(month))
    }
    fn with_month0(&self, month0: u32) -> Option<Self> {
        CalendarDay::map_to_option_self(self.0.with_month0(month0))
    }
    fn with_day(&self, day: u32) -> Option<Self> {
        CalendarDay::map_to_option_self(self.0.with_day(day))
    }
    fn with_day0(&self, day0: u32) -> Option<Self> {
        CalendarDay::map_to_option_self(self.0.with_day0(day0))
    }
    fn with_ordinal(&self, ordinal: u32) -> Option<Self> {
        CalendarDay::map_to_option_self(self.0.with_ordinal(ordinal))
    }
    fn with_ordinal0(&self, ordinal0: u32) -> Option<Self> {
        CalendarDay::map_to_option_self(self.0.with_ordinal0(ordinal0))
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(value: NaiveDate) -> Self {
        CalendarDay(value)
    }
}

impl From<CalendarDay> for NaiveDate {
    fn from(value: CalendarDay) -> Self {
        value.0
    }
}

impl From<CalendarDay> for String {
    fn from(value: CalendarDay) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for CalendarDay {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

impl FromStr for CalendarDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        to_calendar_day(s).ok_or_else(|| format!("unrecognized date: {s:?}"))
    }
}
