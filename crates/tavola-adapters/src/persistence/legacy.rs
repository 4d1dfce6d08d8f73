//! Translation of schedule records written by the original admin dashboard.
//!
//! Those records use camelCase, accept `dailySchedule` as well as
//! `dailySchedules`, `startTime`/`endTime` for opening hours, and carry the
//! governed resource as one of several nullable `*Id` fields. This module is
//! the only place that knows about any of that; the domain types have one
//! canonical shape.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use tavola_core::ids::{ResourceId, ScheduleId, UserId};
use tavola_core::schedule::{
    ApprovalStatus, BreakPeriod, DailySchedule, ExceptionKind, ExceptionReason, ResourceRef,
    Schedule, ScheduleException, ScheduleParts, ScheduleType,
};
use tavola_core::time::{parse_timezone, TimeOfDay};
use tavola_ports::error::ParseError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyScheduleRecord {
    #[serde(alias = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "type")]
    schedule_type: String,
    #[serde(default)]
    restaurant_id: Option<String>,
    #[serde(default)]
    venue_id: Option<String>,
    #[serde(default)]
    kitchen_id: Option<String>,
    #[serde(default)]
    category_id: Option<String>,
    #[serde(default)]
    menu_item_id: Option<String>,
    #[serde(default)]
    business_id: Option<String>,
    #[serde(alias = "dailySchedule")]
    daily_schedules: Vec<LegacyDay>,
    #[serde(default)]
    exceptions: Vec<LegacyException>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    is_active: bool,
    effective_from: String,
    #[serde(default)]
    effective_to: Option<String>,
    #[serde(default)]
    approval_status: Option<String>,
    #[serde(default)]
    approved_by: Option<String>,
    #[serde(default)]
    approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    approval_comments: Option<String>,
    #[serde(default)]
    rejection_reason: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyDay {
    day_of_week: u8,
    is_open: bool,
    #[serde(default, alias = "startTime")]
    open_time: Option<String>,
    #[serde(default, alias = "endTime")]
    close_time: Option<String>,
    #[serde(default)]
    breaks: Vec<LegacyBreak>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyBreak {
    start_time: String,
    end_time: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyException {
    date: String,
    is_open: bool,
    #[serde(default, alias = "startTime")]
    open_time: Option<String>,
    #[serde(default, alias = "endTime")]
    close_time: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default, alias = "description")]
    note: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<LegacyScheduleRecord>),
    One(Box<LegacyScheduleRecord>),
}

pub fn decode(raw: &str) -> Result<Schedule, ParseError> {
    let record: LegacyScheduleRecord =
        serde_json::from_str(raw).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    record.into_schedule()
}

/// Decodes either a single record or a JSON array of records.
pub fn decode_all(raw: &str) -> Result<Vec<Schedule>, ParseError> {
    let records = match serde_json::from_str(raw)
        .map_err(|e| ParseError::InvalidJson(e.to_string()))?
    {
        OneOrMany::Many(records) => records,
        OneOrMany::One(record) => vec![*record],
    };
    records.into_iter().map(|r| r.into_schedule()).collect()
}

impl LegacyScheduleRecord {
    pub fn into_schedule(self) -> Result<Schedule, ParseError> {
        let resource = self.resource()?;
        let timezone = self
            .timezone
            .as_deref()
            .filter(|tz| !tz.trim().is_empty())
            .ok_or_else(|| ParseError::MissingField("timezone".into()))
            .and_then(|tz| parse_timezone(tz).map_err(invalid))?;

        let daily_schedules = self
            .daily_schedules
            .into_iter()
            .map(LegacyDay::into_daily)
            .collect::<Result<Vec<_>, _>>()?;
        let exceptions = self
            .exceptions
            .into_iter()
            .map(LegacyException::into_exception)
            .collect::<Result<Vec<_>, _>>()?;

        let parts = ScheduleParts {
            id: ScheduleId::parse(&self.id).map_err(invalid)?,
            name: self.name,
            description: self.description.filter(|d| !d.trim().is_empty()),
            resource,
            daily_schedules,
            exceptions,
            timezone,
            is_active: self.is_active,
            effective_from: parse_date("effectiveFrom", &self.effective_from)?,
            effective_to: self
                .effective_to
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .map(|d| parse_date("effectiveTo", d))
                .transpose()?,
            approval_status: parse_status(self.approval_status.as_deref())?,
            approved_by: self
                .approved_by
                .as_deref()
                .map(UserId::parse)
                .transpose()
                .map_err(invalid)?,
            approved_at: self.approved_at,
            approval_comments: self.approval_comments,
            rejection_reason: self.rejection_reason,
            staffing: None,
            created_by: UserId::parse(&self.created_by).map_err(invalid)?,
            created_at: self.created_at,
            updated_at: self.updated_at.unwrap_or(self.created_at),
        };
        Schedule::from_parts(parts).map_err(invalid)
    }

    /// Exactly one `*Id` field must be set, and it must match `type`.
    fn resource(&self) -> Result<ResourceRef, ParseError> {
        let populated: Vec<(ScheduleType, &str)> = [
            (ScheduleType::Restaurant, &self.restaurant_id),
            (ScheduleType::Venue, &self.venue_id),
            (ScheduleType::Kitchen, &self.kitchen_id),
            (ScheduleType::Category, &self.category_id),
            (ScheduleType::MenuItem, &self.menu_item_id),
            (ScheduleType::Business, &self.business_id),
        ]
        .into_iter()
        .filter_map(|(kind, id)| {
            id.as_deref()
                .filter(|id| !id.trim().is_empty())
                .map(|id| (kind, id))
        })
        .collect();

        let declared = ScheduleType::parse(&self.schedule_type).map_err(invalid)?;
        match populated.as_slice() {
            [(kind, id)] if *kind == declared => Ok(ResourceRef::new(
                declared,
                ResourceId::parse(id).map_err(invalid)?,
            )),
            [(kind, _)] => Err(ParseError::InvalidPayload(format!(
                "type {declared} does not match populated {kind} reference"
            ))),
            [] => Err(ParseError::MissingField(format!(
                "{}Id",
                camel(declared)
            ))),
            _ => Err(ParseError::InvalidPayload(format!(
                "{} resource references populated, expected one",
                populated.len()
            ))),
        }
    }
}

impl LegacyDay {
    fn into_daily(self) -> Result<DailySchedule, ParseError> {
        let breaks = self
            .breaks
            .into_iter()
            .map(|b| {
                Ok(BreakPeriod::new(
                    parse_time(&b.start_time)?,
                    parse_time(&b.end_time)?,
                    b.name
                        .filter(|n| !n.trim().is_empty())
                        .unwrap_or_else(|| "Break".to_string()),
                ))
            })
            .collect::<Result<Vec<_>, ParseError>>()?;
        Ok(DailySchedule {
            day_of_week: self.day_of_week,
            is_open: self.is_open,
            open_time: parse_optional_time(self.open_time.as_deref())?,
            close_time: parse_optional_time(self.close_time.as_deref())?,
            breaks,
        })
    }
}

impl LegacyException {
    fn into_exception(self) -> Result<ScheduleException, ParseError> {
        let reason = match self.reason.as_deref().map(str::to_ascii_uppercase).as_deref() {
            Some("HOLIDAY") => ExceptionReason::Holiday,
            Some("MAINTENANCE") => ExceptionReason::Maintenance,
            Some("SPECIAL_EVENT") => ExceptionReason::SpecialEvent,
            Some("STAFF_SHORTAGE") => ExceptionReason::StaffShortage,
            _ => ExceptionReason::Other,
        };
        // An explicit type must agree with isOpen; the domain check rejects
        // a mismatch.
        let kind = match self.kind.as_deref().map(str::to_ascii_uppercase).as_deref() {
            None | Some("") => {
                if self.is_open {
                    ExceptionKind::SpecialHours
                } else {
                    ExceptionKind::Closure
                }
            }
            Some("CLOSED") | Some("CLOSURE") => ExceptionKind::Closure,
            Some("SPECIAL_HOURS") | Some("MODIFIED_HOURS") | Some("OPEN") => {
                ExceptionKind::SpecialHours
            }
            Some(other) => {
                return Err(ParseError::InvalidPayload(format!(
                    "unknown exception type {other}"
                )))
            }
        };
        let exception = ScheduleException {
            date: parse_date("exceptions.date", &self.date)?,
            is_open: self.is_open,
            open_time: parse_optional_time(self.open_time.as_deref())?,
            close_time: parse_optional_time(self.close_time.as_deref())?,
            reason,
            kind,
            note: self.note.filter(|n| !n.trim().is_empty()),
        };
        exception.validate().map_err(invalid)?;
        Ok(exception)
    }
}

fn parse_status(status: Option<&str>) -> Result<ApprovalStatus, ParseError> {
    match status.map(str::to_ascii_uppercase).as_deref() {
        None | Some("DRAFT") => Ok(ApprovalStatus::Draft),
        Some("PENDING") | Some("PENDING_APPROVAL") => Ok(ApprovalStatus::PendingApproval),
        Some("APPROVED") => Ok(ApprovalStatus::Approved),
        Some("REJECTED") => Ok(ApprovalStatus::Rejected),
        Some(other) => Err(ParseError::InvalidPayload(format!(
            "unknown approval status {other}"
        ))),
    }
}

/// Accepts `YYYY-MM-DD` and full ISO timestamps, keeping the date part.
fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ParseError> {
    let raw = raw.trim();
    raw.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .ok_or_else(|| ParseError::InvalidPayload(format!("{field}: invalid date {raw}")))
}

fn parse_time(raw: &str) -> Result<TimeOfDay, ParseError> {
    raw.parse().map_err(invalid)
}

fn parse_optional_time(raw: Option<&str>) -> Result<Option<TimeOfDay>, ParseError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(t) => parse_time(t).map(Some),
    }
}

fn camel(kind: ScheduleType) -> &'static str {
    match kind {
        ScheduleType::Restaurant => "restaurant",
        ScheduleType::Venue => "venue",
        ScheduleType::Kitchen => "kitchen",
        ScheduleType::Category => "category",
        ScheduleType::MenuItem => "menuItem",
        ScheduleType::Business => "business",
    }
}

fn invalid(e: impl std::fmt::Display) -> ParseError {
    ParseError::InvalidPayload(e.to_string())
}
