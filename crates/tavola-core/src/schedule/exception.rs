use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::schedule::daily::DailySchedule;
use crate::time::TimeOfDay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionReason {
    Holiday,
    Maintenance,
    SpecialEvent,
    StaffShortage,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionKind {
    /// Closed for the whole date.
    Closure,
    /// Open, optionally with different hours.
    SpecialHours,
}

/// A single calendar date that overrides the weekly pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleException {
    pub date: NaiveDate,
    pub is_open: bool,
    pub open_time: Option<TimeOfDay>,
    pub close_time: Option<TimeOfDay>,
    pub reason: ExceptionReason,
    pub kind: ExceptionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ScheduleException {
    pub fn closure(date: NaiveDate, reason: ExceptionReason) -> Self {
        Self {
            date,
            is_open: false,
            open_time: None,
            close_time: None,
            reason,
            kind: ExceptionKind::Closure,
            note: None,
        }
    }

    pub fn special_hours(
        date: NaiveDate,
        reason: ExceptionReason,
        open_time: TimeOfDay,
        close_time: TimeOfDay,
    ) -> Self {
        Self {
            date,
            is_open: true,
            open_time: Some(open_time),
            close_time: Some(close_time),
            reason,
            kind: ExceptionKind::SpecialHours,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let field = |name: &str| format!("exceptions[{}].{name}", self.date);
        match (self.kind, self.is_open) {
            (ExceptionKind::Closure, true) => {
                return Err(DomainError::validation(
                    field("isOpen"),
                    "a closure cannot be open",
                ))
            }
            (ExceptionKind::SpecialHours, false) => {
                return Err(DomainError::validation(
                    field("isOpen"),
                    "special hours must be open",
                ))
            }
            _ => {}
        }
        if let Some(open) = self.open_time {
            if open.is_end_of_day() {
                return Err(DomainError::validation(
                    field("openTime"),
                    "24:00 is only valid as a closing time",
                ));
            }
        }
        if let (Some(open), Some(close)) = (self.open_time, self.close_time) {
            if open >= close {
                return Err(DomainError::validation(
                    field("closeTime"),
                    format!("{close} is not after opening time {open}"),
                ));
            }
        }
        Ok(())
    }
}

pub fn find_exception(
    exceptions: &[ScheduleException],
    date: NaiveDate,
) -> Option<&ScheduleException> {
    exceptions.iter().find(|e| e.date == date)
}

/// The day as it actually runs once `exception` is taken into account.
///
/// Breaks always come from the weekly pattern, even when the exception
/// changes the hours.
pub fn apply_exception(daily: &DailySchedule, exception: &ScheduleException) -> DailySchedule {
    if !exception.is_open {
        return DailySchedule::closed(daily.day_of_week);
    }
    DailySchedule {
        day_of_week: daily.day_of_week,
        is_open: true,
        open_time: exception.open_time.or(daily.open_time),
        close_time: exception.close_time.or(daily.close_time),
        breaks: daily.breaks.clone(),
    }
}
