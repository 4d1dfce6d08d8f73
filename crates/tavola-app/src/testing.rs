use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use tavola_core::ids::{ResourceId, UserId};
use tavola_core::schedule::{DailySchedule, NewSchedule, ResourceRef, Schedule, ScheduleType};
use tavola_core::time::TimeOfDay;
use tavola_ports::error::PortError;
use tavola_ports::outbound::{Clock, ScheduleRepository};

#[derive(Default)]
pub struct MockScheduleRepo {
    pub schedules: Mutex<Vec<Schedule>>,
}

impl MockScheduleRepo {
    pub fn with(schedules: Vec<Schedule>) -> Self {
        Self {
            schedules: Mutex::new(schedules),
        }
    }

    pub fn get(&self, id: &str) -> Option<Schedule> {
        let schedules = self.schedules.lock().unwrap();
        schedules.iter().find(|s| s.id().to_string() == id).cloned()
    }
}

#[async_trait]
impl ScheduleRepository for MockScheduleRepo {
    async fn save(&self, schedule: &Schedule) -> Result<(), PortError> {
        let mut schedules = self.schedules.lock().unwrap();
        if let Some(pos) = schedules.iter().position(|s| s.id() == schedule.id()) {
            schedules[pos] = schedule.clone();
        } else {
            schedules.push(schedule.clone());
        }
        Ok(())
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Schedule>, PortError> {
        Ok(self.get(id))
    }
    async fn find_by_resource(&self, resource: &ResourceRef) -> Result<Vec<Schedule>, PortError> {
        let schedules = self.schedules.lock().unwrap();
        Ok(schedules
            .iter()
            .filter(|s| s.resource() == resource)
            .cloned()
            .collect())
    }
    async fn list_all(&self) -> Result<Vec<Schedule>, PortError> {
        Ok(self.schedules.lock().unwrap().clone())
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn ts(s: &str) -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn t(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

pub fn restaurant(id: &str) -> ResourceRef {
    ResourceRef::new(ScheduleType::Restaurant, ResourceId::parse(id).unwrap())
}

/// Monday-Saturday with the given hours, closed Sunday, in Dubai time.
pub fn new_schedule(resource: ResourceRef, open: &str, close: &str) -> NewSchedule {
    NewSchedule {
        name: format!("{resource} {open}-{close}"),
        description: None,
        resource,
        timezone: "Asia/Dubai".parse().unwrap(),
        daily_schedules: (0..7)
            .map(|day| {
                if day == 0 {
                    DailySchedule::closed(day)
                } else {
                    DailySchedule::open(day, t(open), t(close))
                }
            })
            .collect(),
        effective_from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        effective_to: None,
        created_by: UserId::new(),
    }
}

pub fn draft(resource: ResourceRef, open: &str, close: &str) -> Schedule {
    Schedule::new(new_schedule(resource, open, close), ts("2024-12-20T10:00:00Z")).unwrap()
}

pub fn approved(resource: ResourceRef, open: &str, close: &str) -> Schedule {
    let mut s = draft(resource, open, close);
    let now = ts("2024-12-21T10:00:00Z");
    s.submit_for_approval(UserId::new(), now).unwrap();
    s.approve(UserId::new(), None, &[], now).unwrap();
    s
}

pub fn active(resource: ResourceRef, open: &str, close: &str) -> Schedule {
    let mut s = approved(resource, open, close);
    s.activate(UserId::new(), &[], ts("2024-12-22T10:00:00Z")).unwrap();
    s
}
