//! Month calendar projection for sub-events.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};

use crate::error::{EventlyError, EventlyResult};
use crate::event::SubEvent;

/// A calendar month being displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarMonth {
    year: i32,
    /// 1-based.
    month: u32,
}

/// One day of the month with the sub-events that cover it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub sub_event_ids: Vec<String>,
}

impl CalendarMonth {
    pub fn new(year: i32, month: u32) -> EventlyResult<Self> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(EventlyError::Validation(format!(
                "Invalid month {}-{:02}",
                year, month
            )));
        }
        Ok(CalendarMonth { year, month })
    }

    /// The month containing today (local time).
    pub fn current() -> Self {
        CalendarMonth::containing(Local::now().date_naive())
    }

    pub fn containing(date: NaiveDate) -> Self {
        CalendarMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Move by `delta` months, wrapping across years.
    pub fn change_month(&self, delta: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + delta;
        CalendarMonth {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn days_in_month(&self) -> u32 {
        let next = self.change_month(1);
        match NaiveDate::from_ymd_opt(next.year, next.month, 1) {
            Some(first_of_next) => (first_of_next - self.first_day()).num_days() as u32,
            None => 31,
        }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let first = self.first_day();
        first.iter_days().take(self.days_in_month() as usize)
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl FromStr for CalendarMonth {
    type Err = EventlyError;

    /// Parse `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EventlyError::Validation(format!("Invalid month '{}'. Expected YYYY-MM", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        CalendarMonth::new(year, month)
    }
}

/// Day of an ISO date string, ignoring any time-of-day.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]` and RFC 3339.
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
}

/// Inclusive day range of a sub-event, `None` if either end is missing or unparsable.
pub fn day_range(sub_event: &SubEvent) -> Option<(NaiveDate, NaiveDate)> {
    Some((parse_day(&sub_event.start_date)?, parse_day(&sub_event.end_date)?))
}

/// For each day of `month`, the ids of the sub-events whose inclusive date
/// range covers it. Ids keep the order of `sub_events`.
pub fn project(month: CalendarMonth, sub_events: &[SubEvent]) -> Vec<DayBucket> {
    let ranges: Vec<(&str, NaiveDate, NaiveDate)> = sub_events
        .iter()
        .filter_map(|s| day_range(s).map(|(start, end)| (s.id.as_str(), start, end)))
        .collect();

    month
        .days()
        .map(|date| DayBucket {
            date,
            sub_event_ids: ranges
                .iter()
                .filter(|(_, start, end)| *start <= date && date <= *end)
                .map(|(id, _, _)| id.to_string())
                .collect(),
        })
        .collect()
}
