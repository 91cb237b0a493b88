//! Calendar access for the engine.
//!
//! The scheduler and the ledger only ever need "today" and the length of the
//! current month, so the engine asks a [`Clock`] instead of the system time.

use chrono::{Datelike, Local, NaiveDate};

pub trait Clock: Send + Sync {
    /// Current calendar day.
    fn today(&self) -> NaiveDate;

    /// Day of month of [`Clock::today`], 1-based.
    fn day_of_month(&self) -> u32 {
        self.today().day()
    }

    /// Number of days in the month of [`Clock::today`].
    fn days_in_month(&self) -> u32 {
        days_in_month(self.today())
    }
}

/// Number of days in the month `date` belongs to.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map_or(31, |last| last.day())
}

/// Key of the month `date` belongs to, `YYYY-MM`.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Number of days of the month named by a [`month_key`].
pub fn month_length(key: &str) -> Option<u32> {
    NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d")
        .ok()
        .map(days_in_month)
}

/// Local wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock stuck on one day.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
