//! Calendar clock deciding which day a request belongs to

use chrono::{DateTime, Days, Local, NaiveDate, TimeZone, Utc};
use std::time::Duration;

use crate::config::DayBoundary;

const ONE_DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Source of "today" for quota accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// Process-local calendar
    Local,
    /// UTC calendar
    Utc,
    /// Pinned date, for tests and replays
    Fixed(NaiveDate),
}

impl Clock {
    /// The current calendar date
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::Local => Local::now().date_naive(),
            Clock::Utc => Utc::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }

    /// Time left until the next day begins on this clock
    pub fn duration_until_next_midnight(&self) -> Duration {
        match self {
            Clock::Local => until_next_midnight(Local::now()),
            Clock::Utc => until_next_midnight(Utc::now()),
            Clock::Fixed(_) => ONE_DAY,
        }
    }
}

impl From<DayBoundary> for Clock {
    fn from(boundary: DayBoundary) -> Self {
        match boundary {
            DayBoundary::Local => Clock::Local,
            DayBoundary::Utc => Clock::Utc,
        }
    }
}

/// Delay from `now` to the first instant of the following calendar day.
///
/// When a DST transition skips midnight the earliest valid instant after it
/// is used; if none can be resolved the delay falls back to a full day.
pub fn until_next_midnight<Tz: TimeZone>(now: DateTime<Tz>) -> Duration {
    let tz = now.timezone();
    let next_midnight = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|midnight| {
            tz.from_local_datetime(&midnight).earliest().or_else(|| {
                tz.from_local_datetime(&(midnight + chrono::Duration::hours(1)))
                    .earliest()
            })
        });

    match next_midnight {
        Some(at) => (at - now).to_std().unwrap_or(Duration::ZERO),
        None => ONE_DAY,
    }
}
