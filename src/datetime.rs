//! Fixed-format date and time strings.
//!
//! Reminders store their trigger as two strings, `dd MMM yyyy` and
//! `hh:mm AM`, always in English regardless of the device locale. The codec
//! reads them as wall-clock time in one configured zone.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%d %b %Y";
pub const TIME_FORMAT: &str = "%I:%M %p";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("Date {0:?} does not match dd MMM yyyy")]
    InvalidDate(String),

    #[error("Time {0:?} does not match hh:mm AM/PM")]
    InvalidTime(String),

    #[error("Local time {date} {time} does not exist in {zone}")]
    NonexistentLocalTime {
        date: String,
        time: String,
        zone: Tz,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct DateTimeCodec {
    zone: Tz,
}

impl DateTimeCodec {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    /// Combines both strings into one instant at second zero.
    ///
    /// Ambiguous wall times (clocks going back) resolve to the earlier
    /// instant; wall times skipped by a DST jump are rejected.
    pub fn parse(&self, date: &str, time: &str) -> Result<DateTime<Utc>, FormatError> {
        let parsed_date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .map_err(|_| FormatError::InvalidDate(date.to_owned()))?;
        let parsed_time = NaiveTime::parse_from_str(time.trim(), TIME_FORMAT)
            .map_err(|_| FormatError::InvalidTime(time.to_owned()))?;

        let local = parsed_date.and_time(parsed_time);

        match self.zone.from_local_datetime(&local) {
            LocalResult::Single(instant) => Ok(instant.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => Err(FormatError::NonexistentLocalTime {
                date: date.to_owned(),
                time: time.to_owned(),
                zone: self.zone,
            }),
        }
    }

    /// Seconds are dropped; storage only keeps minutes.
    pub fn format(&self, instant: DateTime<Utc>) -> (String, String) {
        let local = instant.with_timezone(&self.zone);
        (
            local.format(DATE_FORMAT).to_string(),
            local.format(TIME_FORMAT).to_string(),
        )
    }
}
