// 🕘 Schedule Resolver - "closes at" and display date for a reference instant
//
// Weekday and date are taken in the configured time zone. Every failure mode
// (no entry for today, time string without separator) resolves to an empty
// close time; this module never errors.

use crate::models::{CatalogRecord, RankedRecord, ScheduleEntry};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Separator between opening and closing time ("18:00–02:00")
pub const TIME_RANGE_SEPARATOR: char = '–';

/// Outcome of looking up today's schedule entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleLookup<'a> {
    /// Trimmed text after the separator (may itself be empty)
    Closes(&'a str),
    NoMatchingDay,
    MalformedTime,
}

impl<'a> ScheduleLookup<'a> {
    /// Empty string for anything but a resolved close time
    pub fn close_time(&self) -> String {
        match self {
            ScheduleLookup::Closes(close) => close.to_string(),
            ScheduleLookup::NoMatchingDay | ScheduleLookup::MalformedTime => String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScheduleResolver {
    timezone: Tz,
}

impl ScheduleResolver {
    pub fn new(timezone: Tz) -> Self {
        ScheduleResolver { timezone }
    }

    pub fn utc() -> Self {
        ScheduleResolver::new(Tz::UTC)
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Three-letter weekday of the instant, e.g. "Fri"
    pub fn weekday_abbrev(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.timezone).format("%a").to_string()
    }

    /// Display label, e.g. "Fri, Oct 17, 2025"
    pub fn current_date(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.timezone)
            .format("%a, %b %d, %Y")
            .to_string()
    }

    pub fn lookup<'a>(&self, schedule: &'a [ScheduleEntry], instant: DateTime<Utc>) -> ScheduleLookup<'a> {
        let today = self.weekday_abbrev(instant);

        let Some(entry) = schedule
            .iter()
            .find(|entry| entry.day.eq_ignore_ascii_case(&today))
        else {
            return ScheduleLookup::NoMatchingDay;
        };

        match entry.time.split(TIME_RANGE_SEPARATOR).nth(1) {
            Some(close) => ScheduleLookup::Closes(close.trim()),
            None => ScheduleLookup::MalformedTime,
        }
    }

    pub fn close_time(&self, record: &CatalogRecord, instant: DateTime<Utc>) -> String {
        self.lookup(&record.about.schedule, instant).close_time()
    }

    /// Attach date label and close time to ranked records, order unchanged
    pub fn resolve(&self, records: Vec<CatalogRecord>, instant: DateTime<Utc>) -> Vec<RankedRecord> {
        let current_date = self.current_date(instant);

        records
            .into_iter()
            .map(|record| {
                let close_time = self.close_time(&record, instant);
                RankedRecord {
                    record,
                    current_date: current_date.clone(),
                    close_time,
                }
            })
            .collect()
    }
}

impl Default for ScheduleResolver {
    fn default() -> Self {
        Self::utc()
    }
}
