//! Partial calendar dates used for birth/death fields.
//!
//! Genealogical data is often only known to the year or month, so persisted
//! values are kept as text (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`) and parsed on
//! demand.

use chrono::{Datelike, NaiveDate};
use std::fmt::{Display, Formatter};

/// Date with optional month/day precision.
///
/// Ordering is chronological; a less precise date sorts before a more precise
/// date in the same year (`1950` < `1950-01` < `1950-01-01`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartialDate {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl PartialDate {
    /// Parses `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
    ///
    /// Returns `None` for anything else, including impossible calendar dates.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.trim().split('-');
        let year_text = parts.next()?;
        if year_text.len() != 4 || !year_text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let year = year_text.parse::<i32>().ok()?;

        let month = match parts.next() {
            Some(text) => Some(parse_component(text, 1, 12)?),
            None => None,
        };
        let day = match parts.next() {
            Some(text) => Some(parse_component(text, 1, 31)?),
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }

        let date = Self { year, month, day };
        if let (Some(month), Some(day)) = (month, day) {
            NaiveDate::from_ymd_opt(year, month, day)?;
        }
        Some(date)
    }

    /// Earliest calendar day covered by this date.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month.unwrap_or(1), self.day.unwrap_or(1))
    }

    /// Whole years elapsed between `self` and `until`.
    ///
    /// Missing month/day components are treated as January 1st.
    pub fn years_until(&self, until: NaiveDate) -> Option<i32> {
        let start = self.first_day()?;
        if until < start {
            return None;
        }
        let mut years = until.year() - start.year();
        if (until.month(), until.day()) < (start.month(), start.day()) {
            years -= 1;
        }
        Some(years)
    }
}

impl Display for PartialDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}", self.year)?;
        if let Some(month) = self.month {
            write!(f, "-{month:02}")?;
            if let Some(day) = self.day {
                write!(f, "-{day:02}")?;
            }
        }
        Ok(())
    }
}

fn parse_component(text: &str, min: u32, max: u32) -> Option<u32> {
    if text.len() != 2 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value = text.parse::<u32>().ok()?;
    (min..=max).contains(&value).then_some(value)
}
