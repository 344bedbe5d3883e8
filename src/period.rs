//! Reporting periods and local-calendar stamping.
//!
//! Sessions are bucketed by the listener's local calendar, not UTC. A
//! [`SessionStamp`] captures every calendar field the aggregation queries
//! group on, computed once from the local start timestamp.

use std::fmt;

use chrono::{DateTime, Datelike, Local, Months, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Canonical date format stored in `date_string`. Zero-padded, so
/// lexicographic order equals chronological order.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A (year, month) key identifying one reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthYear {
    pub year: i32,
    pub month: u32,
}

impl MonthYear {
    /// Create a period, rejecting months outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(Error::InvalidPeriod { year, month });
        }
        Ok(Self { year, month })
    }

    /// The month containing the current local date.
    #[must_use]
    pub fn current() -> Self {
        Self::containing(Local::now().date_naive())
    }

    /// The month containing `date`.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First calendar day of the month.
    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Last calendar day of the month.
    #[must_use]
    pub fn last_day(self) -> NaiveDate {
        self.first_day()
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or_else(|| self.first_day())
    }

    /// Number of days in the month.
    #[must_use]
    pub fn days_in_month(self) -> u32 {
        self.last_day().day()
    }

    /// Iterate every calendar day of the month in order.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        self.first_day()
            .iter_days()
            .take(self.days_in_month() as usize)
    }

    /// Human-readable label, e.g. "January 2024".
    #[must_use]
    pub fn label(self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Calendar fields of a session start, derived from local time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStamp {
    /// Epoch milliseconds.
    pub epoch_ms: i64,
    pub year: i32,
    pub month: u32,
    pub day_of_month: u32,
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u32,
    /// `yyyy-MM-dd` in local calendar.
    pub date_string: String,
}

impl SessionStamp {
    /// Decompose a timestamp using the calendar of its own time zone.
    pub fn from_datetime<Tz>(at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let date = at.date_naive();
        Self {
            epoch_ms: at.timestamp_millis(),
            year: date.year(),
            month: date.month(),
            day_of_month: date.day(),
            day_of_week: date.weekday().num_days_from_monday(),
            date_string: format_date(date),
        }
    }
}

/// Format a date in the canonical `yyyy-MM-dd` form.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a canonical `yyyy-MM-dd` date string.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| Error::InvalidDate(value.to_string()))
}
