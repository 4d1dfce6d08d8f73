pub mod approval;
pub mod daily;
pub mod exception;
pub mod staffing;

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{ResourceId, ScheduleId, UserId};

pub use approval::{ApprovalStatus, ScheduleTransition, TransitionAction};
pub use daily::{BreakPeriod, DailySchedule, DAY_NAMES};
pub use exception::{
    apply_exception, find_exception, ExceptionKind, ExceptionReason, ScheduleException,
};
pub use staffing::StaffingInfo;

mod tz_serde {
    use chrono_tz::Tz;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(tz: &Tz, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(tz.name())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Tz, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<Tz>().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleType {
    Restaurant,
    Venue,
    Kitchen,
    Category,
    MenuItem,
    Business,
}

impl ScheduleType {
    pub const ALL: [ScheduleType; 6] = [
        Self::Restaurant,
        Self::Venue,
        Self::Kitchen,
        Self::Category,
        Self::MenuItem,
        Self::Business,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restaurant => "RESTAURANT",
            Self::Venue => "VENUE",
            Self::Kitchen => "KITCHEN",
            Self::Category => "CATEGORY",
            Self::MenuItem => "MENU_ITEM",
            Self::Business => "BUSINESS",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation("type", format!("unknown schedule type {s}")))
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one resource a schedule governs. The kind doubles as the schedule type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ScheduleType,
    pub id: ResourceId,
}

impl ResourceRef {
    pub fn new(kind: ScheduleType, id: ResourceId) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Author input for a fresh draft.
#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub name: String,
    pub description: Option<String>,
    pub resource: ResourceRef,
    pub timezone: Tz,
    pub daily_schedules: Vec<DailySchedule>,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub created_by: UserId,
}

/// Every stored field of a schedule, used to rebuild one from a foreign
/// record format.
#[derive(Debug, Clone)]
pub struct ScheduleParts {
    pub id: ScheduleId,
    pub name: String,
    pub description: Option<String>,
    pub resource: ResourceRef,
    pub daily_schedules: Vec<DailySchedule>,
    pub exceptions: Vec<ScheduleException>,
    pub timezone: Tz,
    pub is_active: bool,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub approval_status: ApprovalStatus,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_comments: Option<String>,
    pub rejection_reason: Option<String>,
    pub staffing: Option<StaffingInfo>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    id: ScheduleId,
    name: String,
    description: Option<String>,
    resource: ResourceRef,
    daily_schedules: Vec<DailySchedule>,
    exceptions: Vec<ScheduleException>,
    #[serde(with = "tz_serde")]
    timezone: Tz,
    is_active: bool,
    effective_from: NaiveDate,
    effective_to: Option<NaiveDate>,
    approval_status: ApprovalStatus,
    approved_by: Option<UserId>,
    approved_at: Option<DateTime<Utc>>,
    approval_comments: Option<String>,
    rejection_reason: Option<String>,
    #[serde(default)]
    staffing: Option<StaffingInfo>,
    #[serde(default)]
    history: Vec<ScheduleTransition>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Schedule {
    pub fn new(draft: NewSchedule, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let schedule = Self {
            id: ScheduleId::new(),
            name: draft.name.trim().to_string(),
            description: draft.description,
            resource: draft.resource,
            daily_schedules: sorted_days(draft.daily_schedules),
            exceptions: vec![],
            timezone: draft.timezone,
            is_active: false,
            effective_from: draft.effective_from,
            effective_to: draft.effective_to,
            approval_status: ApprovalStatus::Draft,
            approved_by: None,
            approved_at: None,
            approval_comments: None,
            rejection_reason: None,
            staffing: None,
            history: vec![],
            created_by: draft.created_by,
            created_at: now,
            updated_at: now,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn from_parts(parts: ScheduleParts) -> Result<Self, DomainError> {
        let schedule = Self {
            id: parts.id,
            name: parts.name.trim().to_string(),
            description: parts.description,
            resource: parts.resource,
            daily_schedules: sorted_days(parts.daily_schedules),
            exceptions: parts.exceptions,
            timezone: parts.timezone,
            is_active: parts.is_active,
            effective_from: parts.effective_from,
            effective_to: parts.effective_to,
            approval_status: parts.approval_status,
            approved_by: parts.approved_by,
            approved_at: parts.approved_at,
            approval_comments: parts.approval_comments,
            rejection_reason: parts.rejection_reason,
            staffing: parts.staffing,
            history: vec![],
            created_by: parts.created_by,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn with_staffing(mut self, staffing: StaffingInfo) -> Self {
        self.staffing = Some(staffing);
        self
    }

    /// Checks every structural invariant. Evaluation refuses to run on a
    /// schedule that fails this.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.is_empty() {
            return Err(DomainError::validation("name", "must not be blank"));
        }
        if self.daily_schedules.len() != 7 {
            return Err(DomainError::validation(
                "dailySchedules",
                format!("expected 7 days, got {}", self.daily_schedules.len()),
            ));
        }
        let mut seen = HashSet::new();
        for day in &self.daily_schedules {
            day.validate()?;
            if !seen.insert(day.day_of_week) {
                return Err(DomainError::validation(
                    "dailySchedules",
                    format!("day {} appears more than once", day.day_of_week),
                ));
            }
        }
        if let Some(to) = self.effective_to {
            if to < self.effective_from {
                return Err(DomainError::validation(
                    "effectiveTo",
                    format!("{to} is before effectiveFrom {}", self.effective_from),
                ));
            }
        }
        let mut dates = HashSet::new();
        for exception in &self.exceptions {
            exception.validate()?;
            if !dates.insert(exception.date) {
                return Err(DomainError::DuplicateException(exception.date));
            }
        }
        if self.is_active && self.approval_status != ApprovalStatus::Approved {
            return Err(DomainError::NotApproved {
                current: self.approval_status,
            });
        }
        Ok(())
    }

    pub fn add_exception(
        &mut self,
        exception: ScheduleException,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        exception.validate()?;
        if find_exception(&self.exceptions, exception.date).is_some() {
            return Err(DomainError::DuplicateException(exception.date));
        }
        self.exceptions.push(exception);
        self.exceptions.sort_by_key(|e| e.date);
        self.updated_at = now;
        Ok(())
    }

    /// Returns the removed exception; removing a date without one is a no-op.
    pub fn remove_exception(
        &mut self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Option<ScheduleException> {
        let pos = self.exceptions.iter().position(|e| e.date == date)?;
        self.updated_at = now;
        Some(self.exceptions.remove(pos))
    }

    pub fn daily(&self, day_of_week: u8) -> Option<&DailySchedule> {
        self.daily_schedules
            .iter()
            .find(|d| d.day_of_week == day_of_week)
    }

    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        date >= self.effective_from && self.effective_to.map_or(true, |to| date <= to)
    }

    /// Whether the two effective windows share at least one date.
    pub fn overlaps_window(&self, other: &Schedule) -> bool {
        let ends_after =
            |a: &Schedule, b: &Schedule| a.effective_to.map_or(true, |to| to >= b.effective_from);
        ends_after(self, other) && ends_after(other, self)
    }

    pub fn id(&self) -> &ScheduleId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn schedule_type(&self) -> ScheduleType {
        self.resource.kind
    }

    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    pub fn daily_schedules(&self) -> &[DailySchedule] {
        &self.daily_schedules
    }

    pub fn exceptions(&self) -> &[ScheduleException] {
        &self.exceptions
    }

    pub fn timezone(&self) -> &Tz {
        &self.timezone
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn effective_from(&self) -> NaiveDate {
        self.effective_from
    }

    pub fn effective_to(&self) -> Option<NaiveDate> {
        self.effective_to
    }

    pub fn approval_status(&self) -> ApprovalStatus {
        self.approval_status
    }

    pub fn approved_by(&self) -> Option<&UserId> {
        self.approved_by.as_ref()
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    pub fn approval_comments(&self) -> Option<&str> {
        self.approval_comments.as_deref()
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn staffing(&self) -> Option<&StaffingInfo> {
        self.staffing.as_ref()
    }

    pub fn history(&self) -> &[ScheduleTransition] {
        &self.history
    }

    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn sorted_days(mut days: Vec<DailySchedule>) -> Vec<DailySchedule> {
    days.sort_by_key(|d| d.day_of_week);
    days
}
