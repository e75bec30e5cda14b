//! `time` dimension derived from event timestamps.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::records::RecordError;

/// Text layout of `time.start_time` and `songplays.start_time`.
pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// `time` dimension row derived from one event timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRow {
    /// UTC timestamp in [`START_TIME_FORMAT`].
    pub start_time: String,
    /// Hour of day, 0-23.
    pub hour: u32,
    /// Day of month, 1-31.
    pub day: u32,
    /// ISO-8601 week number.
    pub week: u32,
    /// Month, 1-12.
    pub month: u32,
    /// Calendar year.
    pub year: i32,
    /// Monday = 0 .. Sunday = 6.
    pub weekday: u32,
}

impl TimeRow {
    /// Decompose epoch milliseconds (UTC).
    pub fn from_millis(ts: i64) -> Result<Self, RecordError> {
        let at = DateTime::<Utc>::from_timestamp_millis(ts)
            .ok_or(RecordError::TimestampOutOfRange { ts })?;
        Ok(Self::from_datetime(&at))
    }

    /// Decompose an already-parsed UTC instant.
    pub fn from_datetime(at: &DateTime<Utc>) -> Self {
        Self {
            start_time: at.format(START_TIME_FORMAT).to_string(),
            hour: at.hour(),
            day: at.day(),
            week: at.iso_week().week(),
            month: at.month(),
            year: at.year(),
            weekday: at.weekday().num_days_from_monday(),
        }
    }
}
