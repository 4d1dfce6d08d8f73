//! Detects schedules competing for the same resource.
//!
//! Only existing schedules that govern the same resource, share at least one
//! effective date, and are approved or live take part. Time intervals are
//! half-open, so one schedule closing at 14:00 and another opening at 14:00
//! do not conflict.

use serde::{Deserialize, Serialize};

use crate::ids::ScheduleId;
use crate::schedule::{ApprovalStatus, Schedule, DAY_NAMES};
use crate::time::TimeOfDay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    OverlappingTimes,
    ResourceConflict,
    StaffConflict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub schedule_id: ScheduleId,
    pub schedule_name: String,
    pub conflict_type: ConflictType,
    pub details: String,
}

pub fn detect_conflicts(candidate: &Schedule, existing: &[Schedule]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for other in existing.iter().filter(|o| competes_with(candidate, o)) {
        let clashes = overlapping_days(candidate, other);

        if !clashes.is_empty() {
            let details = clashes
                .iter()
                .map(|c| c.describe())
                .collect::<Vec<_>>()
                .join("; ");
            conflicts.push(conflict(other, ConflictType::OverlappingTimes, details));
        }

        if other.is_active() {
            conflicts.push(live_conflict(candidate, other));
        }

        if let (Some(mine), Some(theirs)) = (candidate.staffing(), other.staffing()) {
            let shared = mine.shared_with(theirs);
            if !shared.is_empty() && !clashes.is_empty() {
                let staff = shared
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                conflicts.push(conflict(
                    other,
                    ConflictType::StaffConflict,
                    format!("staff {staff} assigned to overlapping hours"),
                ));
            }
        }
    }

    conflicts
}

/// RESOURCE_CONFLICT entries for every other schedule already live for the
/// candidate's resource over an overlapping effective window. Only one
/// schedule may be live per resource at a time.
pub fn activation_conflicts(candidate: &Schedule, existing: &[Schedule]) -> Vec<Conflict> {
    existing
        .iter()
        .filter(|o| competes_with(candidate, o) && o.is_active())
        .map(|other| live_conflict(candidate, other))
        .collect()
}

fn live_conflict(candidate: &Schedule, other: &Schedule) -> Conflict {
    conflict(
        other,
        ConflictType::ResourceConflict,
        format!(
            "{} is already live for {}",
            other.name(),
            candidate.resource()
        ),
    )
}

fn competes_with(candidate: &Schedule, other: &Schedule) -> bool {
    other.id() != candidate.id()
        && other.resource() == candidate.resource()
        && (other.is_active() || other.approval_status() == ApprovalStatus::Approved)
        && candidate.overlaps_window(other)
}

struct DayClash {
    day: u8,
    mine: (TimeOfDay, TimeOfDay),
    theirs: (TimeOfDay, TimeOfDay),
}

impl DayClash {
    fn describe(&self) -> String {
        format!(
            "{} {}-{} overlaps {}-{}",
            DAY_NAMES[usize::from(self.day)],
            self.mine.0,
            self.mine.1,
            self.theirs.0,
            self.theirs.1,
        )
    }
}

fn overlapping_days(a: &Schedule, b: &Schedule) -> Vec<DayClash> {
    (0..7u8)
        .filter_map(|day| {
            let (a_open, a_close) = a.daily(day)?.window()?;
            let (b_open, b_close) = b.daily(day)?.window()?;
            (a_open < b_close && b_open < a_close).then(|| DayClash {
                day,
                mine: (a_open, a_close),
                theirs: (b_open, b_close),
            })
        })
        .collect()
}

fn conflict(other: &Schedule, conflict_type: ConflictType, details: String) -> Conflict {
    Conflict {
        schedule_id: other.id().clone(),
        schedule_name: other.name().to_string(),
        conflict_type,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ResourceId, UserId};
    use crate::schedule::fixtures::*;
    use crate::schedule::{DailySchedule, ResourceRef, ScheduleType, StaffingInfo};

    fn types(conflicts: &[Conflict]) -> Vec<ConflictType> {
        conflicts.iter().map(|c| c.conflict_type).collect()
    }

    fn approved_with(days: Vec<DailySchedule>) -> Schedule {
        let mut s = draft_with(days, "Asia/Dubai");
        let now = ts("2024-12-21T10:00:00Z");
        s.submit_for_approval(UserId::new(), now).unwrap();
        s.approve(UserId::new(), None, &[], now).unwrap();
        s
    }

    #[test]
    fn clean_input_has_no_conflicts() {
        assert!(detect_conflicts(&draft(), &[]).is_empty());
    }

    #[test]
    fn overlapping_hours_with_approved_schedule() {
        let existing = approved();
        let candidate = draft_with(week("20:00", "23:00"), "Asia/Dubai");
        let conflicts = detect_conflicts(&candidate, std::slice::from_ref(&existing));

        assert_eq!(types(&conflicts), vec![ConflictType::OverlappingTimes]);
        assert_eq!(&conflicts[0].schedule_id, existing.id());
        assert_eq!(conflicts[0].schedule_name, "Main hours");
        assert!(conflicts[0].details.contains("Monday 20:00-23:00 overlaps 09:00-22:00"));
        assert!(!conflicts[0].details.contains("Sunday"));
    }

    #[test]
    fn adjacent_hours_do_not_conflict() {
        let existing = approved_with(week("09:00", "14:00"));
        let candidate = draft_with(week("14:00", "22:00"), "Asia/Dubai");
        assert!(detect_conflicts(&candidate, &[existing]).is_empty());
    }

    #[test]
    fn closed_days_never_conflict() {
        let existing = approved_with((0..7).map(DailySchedule::closed).collect());
        assert!(detect_conflicts(&draft(), &[existing]).is_empty());
    }

    #[test]
    fn live_schedule_also_raises_resource_conflict() {
        let existing = active();
        let conflicts = detect_conflicts(&draft(), &[existing]);
        assert_eq!(
            types(&conflicts),
            vec![ConflictType::OverlappingTimes, ConflictType::ResourceConflict]
        );
    }

    #[test]
    fn drafts_pending_and_rejected_are_ignored() {
        let mut pending = draft();
        pending
            .submit_for_approval(UserId::new(), ts("2024-12-21T10:00:00Z"))
            .unwrap();
        assert!(detect_conflicts(&draft(), &[draft(), pending]).is_empty());
    }

    #[test]
    fn other_resources_are_ignored() {
        let kitchen = ResourceRef::new(ScheduleType::Kitchen, ResourceId::parse("rest-1").unwrap());
        let other = for_resource(active(), kitchen);
        assert!(detect_conflicts(&draft(), &[other]).is_empty());
    }

    #[test]
    fn candidate_is_not_compared_with_itself() {
        let s = active();
        assert!(detect_conflicts(&s, std::slice::from_ref(&s)).is_empty());
    }

    #[test]
    fn disjoint_effective_windows_do_not_conflict() {
        let existing = within(active(), "2025-01-01", Some("2025-03-31"));
        let candidate = within(draft(), "2025-04-01", None);
        assert!(detect_conflicts(&candidate, &[existing]).is_empty());
    }

    #[test]
    fn activation_is_blocked_by_live_schedule_even_with_disjoint_hours() {
        let live = active();
        let evening = approved_with(week("14:00", "22:00"));
        let morning = approved_with(week("09:00", "12:00"));

        assert!(detect_conflicts(&evening, std::slice::from_ref(&morning)).is_empty());
        assert!(activation_conflicts(&evening, std::slice::from_ref(&morning)).is_empty());

        let conflicts = activation_conflicts(&evening, &[morning, live.clone()]);
        assert_eq!(types(&conflicts), vec![ConflictType::ResourceConflict]);
        assert_eq!(&conflicts[0].schedule_id, live.id());
    }

    #[test]
    fn activation_ignores_live_schedules_in_other_windows() {
        let live = within(active(), "2025-01-01", Some("2025-03-31"));
        let later = within(approved(), "2025-04-01", None);
        assert!(activation_conflicts(&later, &[live]).is_empty());
    }

    #[test]
    fn staff_conflict_needs_staffing_on_candidate() {
        let shared = UserId::new();
        let existing = approved().with_staffing(StaffingInfo::new(vec![shared.clone()]));

        let plain = detect_conflicts(&draft(), std::slice::from_ref(&existing));
        assert!(!types(&plain).contains(&ConflictType::StaffConflict));

        let staffed =
            draft().with_staffing(StaffingInfo::new(vec![UserId::new(), shared.clone()]));
        let conflicts = detect_conflicts(&staffed, &[existing]);
        assert_eq!(
            types(&conflicts),
            vec![ConflictType::OverlappingTimes, ConflictType::StaffConflict]
        );
        assert!(conflicts[1].details.contains(&shared.to_string()));
    }
}
