use std::sync::Arc;

use time::{Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};
use time_tz::{ToTimezone, Tz, timezones};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Source of "now" in the viewer's local time zone.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    fn today(&self) -> Date {
        self.now().date()
    }
}

pub type SharedClock = Arc<dyn Clock>;

#[derive(Clone, Copy)]
pub struct SystemClock {
    tz: Option<&'static Tz>,
}

impl SystemClock {
    pub fn utc() -> Self {
        Self { tz: None }
    }

    /// Unknown zone names fall back to UTC.
    pub fn new(tz: impl AsRef<str>) -> Self {
        Self {
            tz: timezones::get_by_name(tz.as_ref()),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();

        match self.tz {
            Some(tz) => now.to_timezone(tz),
            None => now,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

pub fn is_known_timezone(name: &str) -> bool {
    name == "UTC" || timezones::get_by_name(name).is_some()
}

/// `YYYY-MM-DD` of a local calendar date.
pub fn format_date(date: Date) -> crate::Result<String> {
    Ok(date.format(DATE_FORMAT)?)
}

pub fn parse_date(value: &str) -> crate::Result<Date> {
    Ok(Date::parse(value, DATE_FORMAT)?)
}

/// ISO-8601 week number: Monday starts the week and week 1 holds the year's
/// first Thursday.
pub fn iso_week(date: Date) -> u8 {
    date.iso_week()
}

pub fn iso_weeks_in_year(year: i32) -> u8 {
    time::util::weeks_in_year(year)
}

/// Month index as stored in plans: January is 0.
pub fn month_index(date: Date) -> u8 {
    u8::from(date.month()) - 1
}
