//! Conversion between UTC instants and schedule-local wall time.
//!
//! Schedules store zone-naive `HH:MM` times next to an IANA timezone name.
//! Everything that needs "what time is it at the restaurant" goes through
//! [`normalize`], and everything that turns a local boundary back into an
//! instant goes through [`to_instant`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

// Longest DST gap in the tz database is one hour; leave headroom.
const MAX_GAP_MINUTES: i64 = 180;

/// A zone-naive time of day with minute resolution.
///
/// `24:00` is representable and means "end of day"; it is only meaningful
/// as an exclusive end (close time, break end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: Self = Self(0);
    pub const END_OF_DAY: Self = Self(MINUTES_PER_DAY);

    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, DomainError> {
        if minute > 59 || hour > 24 || (hour == 24 && minute != 0) {
            return Err(invalid_time(&format!("{hour:02}:{minute:02}")));
        }
        Ok(Self((hour * 60 + minute) as u16))
    }

    pub fn from_minutes(minutes: u16) -> Result<Self, DomainError> {
        if minutes > MINUTES_PER_DAY {
            return Err(invalid_time(&format!("{minutes} minutes")));
        }
        Ok(Self(minutes))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn is_end_of_day(self) -> bool {
        self.0 == MINUTES_PER_DAY
    }
}

fn invalid_time(text: &str) -> DomainError {
    DomainError::validation("time", format!("invalid time of day {text:?}"))
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = DomainError;

    /// Accepts `HH:MM` and `HH:MM:00`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || invalid_time(s);
        let mut parts = s.trim().split(':');
        let hour = parts.next().ok_or_else(invalid)?;
        let minute = parts.next().ok_or_else(invalid)?;
        if let Some(seconds) = parts.next() {
            if seconds != "00" {
                return Err(invalid());
            }
        }
        if parts.next().is_some() || hour.len() != 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).map_err(|_| invalid())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An instant seen through a schedule's timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalPoint {
    pub date: NaiveDate,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    /// 0..=1439
    pub minute: u16,
}

pub fn parse_timezone(name: &str) -> Result<Tz, DomainError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| DomainError::InvalidTimezone(name.to_string()))
}

pub fn normalize(instant: DateTime<Utc>, timezone: &str) -> Result<LocalPoint, DomainError> {
    let tz = parse_timezone(timezone)?;
    Ok(normalize_in(instant, tz))
}

pub fn normalize_in(instant: DateTime<Utc>, tz: Tz) -> LocalPoint {
    let local = instant.with_timezone(&tz);
    LocalPoint {
        date: local.date_naive(),
        day_of_week: day_of_week(local.date_naive()),
        minute: (local.hour() * 60 + local.minute()) as u16,
    }
}

pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Resolves local wall time on `date` back to a UTC instant.
///
/// Ambiguous times (clocks going back) resolve to the earlier instant.
/// Times inside a DST gap resolve to the first minute after the gap.
/// `minute == 1440` is midnight of the following day.
pub fn to_instant(tz: Tz, date: NaiveDate, minute: u16) -> Option<DateTime<Utc>> {
    to_instants(tz, date, minute).into_iter().next()
}

/// Every instant at which local wall time `minute` on `date` occurs, in
/// order. Two on a fall-back day, one otherwise; gap times shift past the
/// gap as in [`to_instant`].
pub fn to_instants(tz: Tz, date: NaiveDate, minute: u16) -> Vec<DateTime<Utc>> {
    let (date, minute) = if minute >= MINUTES_PER_DAY {
        match date.succ_opt() {
            Some(next) => (next, minute - MINUTES_PER_DAY),
            None => return vec![],
        }
    } else {
        (date, minute)
    };
    let Some(naive) = date.and_hms_opt(u32::from(minute / 60), u32::from(minute % 60), 0) else {
        return vec![];
    };

    (0..=MAX_GAP_MINUTES)
        .find_map(|step| match tz.from_local_datetime(&(naive + Duration::minutes(step))) {
            LocalResult::Single(t) => Some(vec![t.with_timezone(&Utc)]),
            LocalResult::Ambiguous(first, second) => {
                Some(vec![first.with_timezone(&Utc), second.with_timezone(&Utc)])
            }
            LocalResult::None => None,
        })
        .unwrap_or_default()
}
