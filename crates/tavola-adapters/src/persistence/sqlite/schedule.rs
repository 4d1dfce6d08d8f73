use async_trait::async_trait;

use tavola_core::schedule::{ResourceRef, Schedule};
use tavola_ports::error::PortError;
use tavola_ports::outbound::ScheduleRepository;

use super::{SqliteDb, CANONICAL_FORMAT, LEGACY_FORMAT};
use crate::persistence::legacy;

type Row = (i64, String);

fn decode_row((version, data): Row) -> Result<Schedule, PortError> {
    match version {
        CANONICAL_FORMAT => {
            serde_json::from_str(&data).map_err(|e| PortError::Persistence(e.to_string()))
        }
        LEGACY_FORMAT => legacy::decode(&data).map_err(|e| PortError::Persistence(e.to_string())),
        other => Err(PortError::Persistence(format!(
            "unsupported schedule format version {other}"
        ))),
    }
}

impl SqliteDb {
    /// Stores a record exported by the old dashboard as-is. It is decoded
    /// now to reject bad input and again on every read until it is saved in
    /// the canonical format.
    pub async fn store_legacy(&self, raw: &str) -> Result<Schedule, PortError> {
        let schedule = legacy::decode(raw).map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query(
            "INSERT INTO schedules (id, resource_kind, resource_id, format_version, data)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                resource_kind = excluded.resource_kind,
                resource_id = excluded.resource_id,
                format_version = excluded.format_version,
                data = excluded.data",
        )
        .bind(schedule.id().to_string())
        .bind(schedule.resource().kind.as_str())
        .bind(schedule.resource().id.as_str())
        .bind(LEGACY_FORMAT)
        .bind(raw)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        tracing::debug!(schedule_id = %schedule.id(), "stored legacy schedule record");
        Ok(schedule)
    }
}

#[async_trait]
impl ScheduleRepository for SqliteDb {
    async fn save(&self, schedule: &Schedule) -> Result<(), PortError> {
        let data =
            serde_json::to_string(schedule).map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query(
            "INSERT INTO schedules (id, resource_kind, resource_id, format_version, data)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                resource_kind = excluded.resource_kind,
                resource_id = excluded.resource_id,
                format_version = excluded.format_version,
                data = excluded.data",
        )
        .bind(schedule.id().to_string())
        .bind(schedule.resource().kind.as_str())
        .bind(schedule.resource().id.as_str())
        .bind(CANONICAL_FORMAT)
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Schedule>, PortError> {
        let row: Option<Row> =
            sqlx::query_as("SELECT format_version, data FROM schedules WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PortError::Persistence(e.to_string()))?;

        row.map(decode_row).transpose()
    }

    async fn find_by_resource(&self, resource: &ResourceRef) -> Result<Vec<Schedule>, PortError> {
        let rows: Vec<Row> = sqlx::query_as(
            "SELECT format_version, data FROM schedules
             WHERE resource_kind = ? AND resource_id = ?",
        )
        .bind(resource.kind.as_str())
        .bind(resource.id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        rows.into_iter().map(decode_row).collect()
    }

    async fn list_all(&self) -> Result<Vec<Schedule>, PortError> {
        let rows: Vec<Row> = sqlx::query_as("SELECT format_version, data FROM schedules")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        rows.into_iter().map(decode_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use tavola_core::ids::{ResourceId, UserId};
    use tavola_core::schedule::{
        BreakPeriod, DailySchedule, ExceptionReason, NewSchedule, ScheduleException,
        ScheduleType, StaffingInfo,
    };
    use tavola_core::time::TimeOfDay;

    async fn db() -> SqliteDb {
        SqliteDb::new("sqlite::memory:").await.unwrap()
    }

    fn resource(kind: ScheduleType, id: &str) -> ResourceRef {
        ResourceRef::new(kind, ResourceId::parse(id).unwrap())
    }

    fn make_schedule(name: &str, resource: ResourceRef) -> Schedule {
        let open: TimeOfDay = "09:00".parse().unwrap();
        let close: TimeOfDay = "22:00".parse().unwrap();
        Schedule::new(
            NewSchedule {
                name: name.into(),
                description: None,
                resource,
                timezone: "Asia/Dubai".parse().unwrap(),
                daily_schedules: (0..7).map(|d| DailySchedule::open(d, open, close)).collect(),
                effective_from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                effective_to: None,
                created_by: UserId::new(),
            },
            Utc.with_ymd_and_hms(2024, 12, 1, 8, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn at(day: u32, hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, day, hour, 0, 0).unwrap()
    }

    /// Breaks, exceptions, staffing, an end date and a full approval trail.
    fn fully_populated(resource: ResourceRef) -> Schedule {
        let t = |s: &str| s.parse::<TimeOfDay>().unwrap();
        let days = (0..7)
            .map(|d| {
                if d == 0 {
                    DailySchedule::closed(d)
                } else {
                    DailySchedule::open(d, t("09:00"), t("24:00"))
                        .with_break(BreakPeriod::new(t("15:00"), t("17:30"), "Siesta"))
                }
            })
            .collect();
        let mut s = Schedule::new(
            NewSchedule {
                name: "Terrace".into(),
                description: Some("Summer terrace".into()),
                resource,
                timezone: "Europe/Zurich".parse().unwrap(),
                daily_schedules: days,
                effective_from: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
                effective_to: NaiveDate::from_ymd_opt(2025, 9, 30),
                created_by: UserId::new(),
            },
            at(1, 8),
        )
        .unwrap()
        .with_staffing(StaffingInfo::new(vec![UserId::new(), UserId::new()]));

        s.add_exception(
            ScheduleException::closure(
                NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
                ExceptionReason::Holiday,
            )
            .with_note("National day"),
            at(2, 8),
        )
        .unwrap();
        s.add_exception(
            ScheduleException::special_hours(
                NaiveDate::from_ymd_opt(2025, 6, 21).unwrap(),
                ExceptionReason::SpecialEvent,
                t("18:00"),
                t("23:30"),
            ),
            at(2, 9),
        )
        .unwrap();
        s
    }

    fn legacy_record(id: &str) -> String {
        let days: Vec<String> = (0..7)
            .map(|d| {
                format!(
                    r#"{{"dayOfWeek": {d}, "isOpen": true, "startTime": "10:00", "endTime": "18:00"}}"#
                )
            })
            .collect();
        format!(
            r#"{{
                "_id": "{id}",
                "name": "Old kitchen hours",
                "type": "KITCHEN",
                "kitchenId": "k-7",
                "dailySchedule": [{}],
                "timezone": "Europe/Zurich",
                "effectiveFrom": "2024-06-01",
                "createdBy": "{}",
                "createdAt": "2024-05-20T10:00:00Z"
            }}"#,
            days.join(","),
            uuid::Uuid::new_v4()
        )
    }

    #[tokio::test]
    async fn save_and_find_by_id() {
        let db = db().await;
        let sched = make_schedule("mall", resource(ScheduleType::Restaurant, "r-1"));
        let id = sched.id().to_string();

        db.save(&sched).await.unwrap();

        let found = db.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found, sched);
        assert!(db.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn canonical_rows_keep_every_field() {
        let db = db().await;

        let mut live = fully_populated(resource(ScheduleType::Venue, "v-1"));
        live.submit_for_approval(UserId::new(), at(3, 8)).unwrap();
        live.approve(UserId::new(), Some("fine".into()), &[], at(4, 8))
            .unwrap();
        live.activate(UserId::new(), &[], at(5, 8)).unwrap();
        live.deactivate(UserId::new(), Some("storm".into()), at(6, 8))
            .unwrap();
        live.activate(UserId::new(), &[], at(7, 8)).unwrap();

        let mut rejected = fully_populated(resource(ScheduleType::Venue, "v-2"));
        rejected.submit_for_approval(UserId::new(), at(3, 8)).unwrap();
        rejected
            .reject(UserId::new(), "too late in the season", at(4, 8))
            .unwrap();

        for schedule in [&live, &rejected] {
            db.save(schedule).await.unwrap();
            let found = db
                .find_by_id(&schedule.id().to_string())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(&found, schedule);
        }

        let found = db.find_by_id(&live.id().to_string()).await.unwrap().unwrap();
        assert_eq!(found.history().len(), 5);
        assert_eq!(found.exceptions().len(), 2);
        assert_eq!(found.daily(1).unwrap().breaks[0].name, "Siesta");
        assert_eq!(found.staffing().map(|s| s.staff.len()), Some(2));
        assert_eq!(found.approval_comments(), Some("fine"));
        assert!(found.approved_at().is_some());
        assert_eq!(
            found.effective_to(),
            NaiveDate::from_ymd_opt(2025, 9, 30)
        );
    }

    #[tokio::test]
    async fn save_overwrites_existing_row() {
        let db = db().await;
        let mut sched = make_schedule("mall", resource(ScheduleType::Restaurant, "r-1"));
        db.save(&sched).await.unwrap();

        sched
            .submit_for_approval(UserId::new(), Utc.with_ymd_and_hms(2024, 12, 2, 8, 0, 0).unwrap())
            .unwrap();
        db.save(&sched).await.unwrap();

        let all = db.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].approval_status(), sched.approval_status());
    }

    #[tokio::test]
    async fn find_by_resource_filters_on_kind_and_id() {
        let db = db().await;
        db.save(&make_schedule("a", resource(ScheduleType::Restaurant, "r-1")))
            .await
            .unwrap();
        db.save(&make_schedule("b", resource(ScheduleType::Restaurant, "r-1")))
            .await
            .unwrap();
        db.save(&make_schedule("c", resource(ScheduleType::Restaurant, "r-2")))
            .await
            .unwrap();
        db.save(&make_schedule("d", resource(ScheduleType::Venue, "r-1")))
            .await
            .unwrap();

        let found = db
            .find_by_resource(&resource(ScheduleType::Restaurant, "r-1"))
            .await
            .unwrap();
        let mut names: Vec<&str> = found.iter().map(|s| s.name()).collect();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn legacy_rows_decode_on_read_and_upgrade_on_save() {
        let db = db().await;
        let id = uuid::Uuid::new_v4().to_string();

        let imported = db.store_legacy(&legacy_record(&id)).await.unwrap();
        assert_eq!(imported.resource().kind, ScheduleType::Kitchen);

        let found = db.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found, imported);
        let by_resource = db
            .find_by_resource(&resource(ScheduleType::Kitchen, "k-7"))
            .await
            .unwrap();
        assert_eq!(by_resource.len(), 1);

        db.save(&found).await.unwrap();
        let (version,): (i64,) = sqlx::query_as("SELECT format_version FROM schedules WHERE id = ?")
            .bind(&id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(version, CANONICAL_FORMAT);
    }

    #[tokio::test]
    async fn store_legacy_rejects_bad_records() {
        let db = db().await;
        let raw = legacy_record("not-a-uuid");
        assert!(matches!(
            db.store_legacy(&raw).await,
            Err(PortError::Persistence(_))
        ));
        assert!(db.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_format_version_is_an_error() {
        let db = db().await;
        sqlx::query(
            "INSERT INTO schedules (id, resource_kind, resource_id, format_version, data)
             VALUES ('x', 'RESTAURANT', 'r-1', 9, '{}')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        assert!(matches!(
            db.find_by_id("x").await,
            Err(PortError::Persistence(msg)) if msg.contains("version 9")
        ));
    }
}
