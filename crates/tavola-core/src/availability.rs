//! Open / closed / on-break evaluation for a schedule at an instant.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::schedule::{
    apply_exception, find_exception, DailySchedule, Schedule, ScheduleException,
};
use crate::time::{self, LocalPoint, MINUTES_PER_DAY};

pub const DEFAULT_LOOKAHEAD_DAYS: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityStatus {
    Open,
    Closed,
    OnBreak,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub status: AvailabilityStatus,
    pub break_name: Option<String>,
    /// The day as it runs at the evaluated date, exception applied.
    pub today: Option<DailySchedule>,
    pub active_exception: Option<ScheduleException>,
    /// `None` when nothing changes within the lookahead, or when the
    /// schedule is not in force at all.
    pub next_change: Option<DateTime<Utc>>,
}

impl Availability {
    fn out_of_service() -> Self {
        Self {
            status: AvailabilityStatus::Closed,
            break_name: None,
            today: None,
            active_exception: None,
            next_change: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    status: AvailabilityStatus,
    break_name: Option<String>,
}

impl Slot {
    fn closed() -> Self {
        Self {
            status: AvailabilityStatus::Closed,
            break_name: None,
        }
    }

    /// Breaks are checked before the operating window.
    fn of(day: &DailySchedule, minute: u16) -> Self {
        if !day.is_open {
            return Self::closed();
        }
        if let Some(name) = day.break_at(minute) {
            return Self {
                status: AvailabilityStatus::OnBreak,
                break_name: Some(name.to_string()),
            };
        }
        if day.is_within_operating_window(minute) {
            return Self {
                status: AvailabilityStatus::Open,
                break_name: None,
            };
        }
        Self::closed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluator {
    lookahead_days: u32,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKAHEAD_DAYS)
    }
}

impl Evaluator {
    pub fn new(lookahead_days: u32) -> Self {
        Self { lookahead_days }
    }

    pub fn lookahead_days(&self) -> u32 {
        self.lookahead_days
    }

    pub fn evaluate(
        &self,
        schedule: &Schedule,
        at: DateTime<Utc>,
    ) -> Result<Availability, DomainError> {
        schedule.validate()?;

        let point = time::normalize_in(at, *schedule.timezone());
        if !schedule.is_active() || !schedule.is_effective_on(point.date) {
            return Ok(Availability::out_of_service());
        }

        let (today, exception) = effective_day(schedule, point.date);
        let current = Slot::of(&today, point.minute);
        let next_change = self.next_change(schedule, at, &point, &current);

        Ok(Availability {
            status: current.status,
            break_name: current.break_name,
            today: Some(today),
            active_exception: exception.cloned(),
            next_change,
        })
    }

    fn next_change(
        &self,
        schedule: &Schedule,
        at: DateTime<Utc>,
        point: &LocalPoint,
        current: &Slot,
    ) -> Option<DateTime<Utc>> {
        let tz = *schedule.timezone();
        let mut date = point.date;

        for offset in 0..=self.lookahead_days {
            let (day, _) = effective_day(schedule, date);
            let candidates: Vec<u16> = if offset == 0 {
                day.boundaries()
                    .into_iter()
                    .filter(|m| *m > point.minute)
                    .collect()
            } else {
                std::iter::once(0).chain(day.boundaries()).collect()
            };

            // 24:00 is picked up as minute 0 of the following day.
            for minute in candidates.into_iter().filter(|m| *m < MINUTES_PER_DAY) {
                if Slot::of(&day, minute) == *current {
                    continue;
                }
                // On a fall-back day a boundary may already have passed once.
                if let Some(instant) = time::to_instants(tz, date, minute)
                    .into_iter()
                    .find(|instant| *instant > at)
                {
                    return Some(instant);
                }
            }
            date = date.succ_opt()?;
        }
        None
    }
}

/// The day's hours with any exception for `date` applied. Dates outside the
/// effective window are closed.
fn effective_day(
    schedule: &Schedule,
    date: NaiveDate,
) -> (DailySchedule, Option<&ScheduleException>) {
    let day_of_week = time::day_of_week(date);
    let pattern = match schedule.daily(day_of_week) {
        Some(day) if schedule.is_effective_on(date) => day,
        _ => return (DailySchedule::closed(day_of_week), None),
    };
    match find_exception(schedule.exceptions(), date) {
        Some(exception) => (apply_exception(pattern, exception), Some(exception)),
        None => (pattern.clone(), None),
    }
}
