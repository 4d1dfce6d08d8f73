use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::time::TimeOfDay;

pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakPeriod {
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub name: String,
}

impl BreakPeriod {
    pub fn new(start_time: TimeOfDay, end_time: TimeOfDay, name: impl Into<String>) -> Self {
        Self {
            start_time,
            end_time,
            name: name.into(),
        }
    }

    pub fn contains(&self, minute: u16) -> bool {
        minute >= self.start_time.minutes() && minute < self.end_time.minutes()
    }
}

/// Operating hours for one day of the week.
///
/// Windows are half-open: a resource opening at 09:00 and closing at 22:00
/// is open at 09:00 and closed at 22:00. Breaks follow the same rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySchedule {
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    pub is_open: bool,
    pub open_time: Option<TimeOfDay>,
    pub close_time: Option<TimeOfDay>,
    #[serde(default)]
    pub breaks: Vec<BreakPeriod>,
}

impl DailySchedule {
    pub fn closed(day_of_week: u8) -> Self {
        Self {
            day_of_week,
            is_open: false,
            open_time: None,
            close_time: None,
            breaks: vec![],
        }
    }

    pub fn open(day_of_week: u8, open_time: TimeOfDay, close_time: TimeOfDay) -> Self {
        Self {
            day_of_week,
            is_open: true,
            open_time: Some(open_time),
            close_time: Some(close_time),
            breaks: vec![],
        }
    }

    pub fn with_break(mut self, brk: BreakPeriod) -> Self {
        self.breaks.push(brk);
        self
    }

    /// The `[open, close)` interval, if the day is open and well formed.
    pub fn window(&self) -> Option<(TimeOfDay, TimeOfDay)> {
        if !self.is_open {
            return None;
        }
        match (self.open_time, self.close_time) {
            (Some(open), Some(close)) if open < close => Some((open, close)),
            _ => None,
        }
    }

    pub fn is_within_operating_window(&self, minute: u16) -> bool {
        self.window()
            .map(|(open, close)| minute >= open.minutes() && minute < close.minutes())
            .unwrap_or(false)
    }

    /// Name of the break covering `minute`, if any.
    pub fn break_at(&self, minute: u16) -> Option<&str> {
        if !self.is_open {
            return None;
        }
        self.breaks
            .iter()
            .find(|b| b.contains(minute))
            .map(|b| b.name.as_str())
    }

    /// Every minute at which the classification of this day may change,
    /// ascending and without duplicates.
    pub fn boundaries(&self) -> Vec<u16> {
        if !self.is_open {
            return vec![];
        }
        let mut points: Vec<u16> = self
            .open_time
            .iter()
            .chain(self.close_time.iter())
            .map(|t| t.minutes())
            .chain(
                self.breaks
                    .iter()
                    .flat_map(|b| [b.start_time.minutes(), b.end_time.minutes()]),
            )
            .collect();
        points.sort_unstable();
        points.dedup();
        points
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let day = self.day_of_week;
        if day > 6 {
            return Err(DomainError::validation(
                "dailySchedules.dayOfWeek",
                format!("{day} is not a day of the week (0-6)"),
            ));
        }
        if !self.is_open {
            return Ok(());
        }

        let field = |name: &str| format!("dailySchedules[{day}].{name}");
        let open = self
            .open_time
            .ok_or_else(|| DomainError::validation(field("openTime"), "required when open"))?;
        let close = self
            .close_time
            .ok_or_else(|| DomainError::validation(field("closeTime"), "required when open"))?;
        if open.is_end_of_day() {
            return Err(DomainError::validation(
                field("openTime"),
                "24:00 is only valid as a closing time",
            ));
        }
        if open >= close {
            return Err(DomainError::validation(
                field("closeTime"),
                format!("{close} is not after opening time {open}"),
            ));
        }

        let mut breaks: Vec<&BreakPeriod> = self.breaks.iter().collect();
        breaks.sort_by_key(|b| b.start_time);
        for (i, brk) in breaks.iter().enumerate() {
            if brk.name.trim().is_empty() {
                return Err(DomainError::validation(field("breaks.name"), "must not be blank"));
            }
            if brk.start_time >= brk.end_time {
                return Err(DomainError::validation(
                    field("breaks"),
                    format!("break '{}' ends before it starts", brk.name),
                ));
            }
            if brk.start_time < open || brk.end_time > close {
                return Err(DomainError::validation(
                    field("breaks"),
                    format!("break '{}' is outside {open}-{close}", brk.name),
                ));
            }
            if let Some(next) = breaks.get(i + 1) {
                if next.start_time < brk.end_time {
                    return Err(DomainError::validation(
                        field("breaks"),
                        format!("breaks '{}' and '{}' overlap", brk.name, next.name),
                    ));
                }
            }
        }
        Ok(())
    }
}
