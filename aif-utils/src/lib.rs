//! Shared utility functions for AIF crates.

/// Date display helpers
pub mod dates {
    use chrono::{DateTime, NaiveDate, TimeZone};

    /// Format a NaiveDate as "YYYY/MM/DD", the dashboard's display form
    pub fn format_slash_date(date: &NaiveDate) -> String {
        date.format("%Y/%m/%d").to_string()
    }

    /// Format a timestamp as "YYYY-MM-DD HH:MM:SS" in its own offset
    pub fn format_timestamp<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }

}

/// Number formatting for the dashboard cards
pub mod display {
    /// "650.0 m³"
    pub fn format_volume(value: f64) -> String {
        format!("{value:.1} m³")
    }

    /// R² as a percentage, "87.5%"
    pub fn format_ratio_percent(ratio: f64) -> String {
        format!("{:.1}%", ratio * 100.0)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_format_volume_and_percent() {
            assert_eq!(format_volume(650.0), "650.0 m³");
            assert_eq!(format_volume(12.345), "12.3 m³");
            assert_eq!(format_ratio_percent(0.875), "87.5%");
            assert_eq!(format_ratio_percent(0.0), "0.0%");
        }
    }
}

/// Guards applied to uploaded artifacts before anything is written
pub mod uploads {
    use crate::error::UploadError;

    /// Largest accepted upload, in MiB
    pub const MAX_UPLOAD_MB: u64 = 5;

    /// Reject uploads larger than `max_mb` MiB.
    pub fn validate_file_size(bytes: u64, max_mb: u64) -> Result<(), UploadError> {
        let max_bytes = max_mb * 1024 * 1024;
        if bytes > max_bytes {
            return Err(UploadError::TooLarge { bytes, max_mb });
        }
        Ok(())
    }

    /// Uploaded file names must match the artifact name exactly.
    pub fn validate_file_name(name: &str, expected: &str) -> Result<(), UploadError> {
        if name != expected {
            return Err(UploadError::WrongName {
                name: name.to_string(),
                expected: expected.to_string(),
            });
        }
        Ok(())
    }

}

/// Error types
pub mod error {
    use std::fmt;

    #[derive(Debug, PartialEq)]
    pub enum UploadError {
        TooLarge { bytes: u64, max_mb: u64 },
        WrongName { name: String, expected: String },
    }

    impl fmt::Display for UploadError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                UploadError::TooLarge { bytes, max_mb } => write!(
                    f,
                    "file exceeds {}MB ({:.2}MB)",
                    max_mb,
                    *bytes as f64 / 1024.0 / 1024.0
                ),
                UploadError::WrongName { name, expected } => write!(
                    f,
                    "invalid file name {name:?}; only {expected} is allowed"
                ),
            }
        }
    }

    impl std::error::Error for UploadError {}
}
