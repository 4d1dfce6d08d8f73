use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use tavola_core::conflict::{detect_conflicts, Conflict};
use tavola_core::error::DomainError;
use tavola_core::ids::{ScheduleId, UserId};
use tavola_core::schedule::{NewSchedule, Schedule, ScheduleException, TransitionAction};
use tavola_ports::error::PortError;
use tavola_ports::outbound::{Clock, ScheduleRepository};
use tavola_ports::types::{BulkItemResult, BulkOperation, BulkOutcome};

use crate::error::AppError;

/// Authoring surface: drafts, approval workflow, exceptions, bulk actions.
pub struct ScheduleService<S, C>
where
    S: ScheduleRepository,
    C: Clock,
{
    schedules: S,
    clock: C,
}

impl<S, C> ScheduleService<S, C>
where
    S: ScheduleRepository,
    C: Clock,
{
    pub fn new(schedules: S, clock: C) -> Self {
        Self { schedules, clock }
    }

    pub async fn create_schedule(&self, draft: NewSchedule) -> Result<Schedule, AppError> {
        let schedule = Schedule::new(draft, self.clock.now())?;
        self.schedules.save(&schedule).await?;
        info!(
            schedule_id = %schedule.id(),
            resource = %schedule.resource(),
            "schedule drafted"
        );
        Ok(schedule)
    }

    pub async fn get_schedule(&self, schedule_id: &str) -> Result<Schedule, AppError> {
        let id = ScheduleId::parse(schedule_id)?;
        self.schedules
            .find_by_id(&id.to_string())
            .await?
            .ok_or(AppError::Port(PortError::NotFound))
    }

    pub async fn submit_for_approval(
        &self,
        schedule_id: &str,
        actor: UserId,
    ) -> Result<Schedule, AppError> {
        let schedule = self.get_schedule(schedule_id).await?;
        self.transition(schedule, TransitionAction::Submit, |s, now| {
            s.submit_for_approval(actor, now)
        })
        .await
    }

    /// Approves a pending schedule after checking it against every other
    /// schedule stored for the same resource.
    pub async fn approve(
        &self,
        schedule_id: &str,
        approver: UserId,
        comments: Option<String>,
    ) -> Result<Schedule, AppError> {
        let schedule = self.get_schedule(schedule_id).await?;
        let existing = self.schedules.find_by_resource(schedule.resource()).await?;

        let result = self
            .transition(schedule, TransitionAction::Approve, |s, now| {
                s.approve(approver, comments, &existing, now)
            })
            .await;
        if let Err(AppError::Domain(DomainError::ConflictBlocked(conflicts))) = &result {
            warn!(
                schedule_id,
                conflicts = conflicts.len(),
                "approval blocked by conflicts"
            );
        }
        result
    }

    pub async fn reject(
        &self,
        schedule_id: &str,
        actor: UserId,
        reason: &str,
    ) -> Result<Schedule, AppError> {
        let schedule = self.get_schedule(schedule_id).await?;
        self.transition(schedule, TransitionAction::Reject, |s, now| {
            s.reject(actor, reason, now)
        })
        .await
    }

    /// Makes an approved schedule live. Refused while another schedule for
    /// the same resource is live over an overlapping effective window.
    pub async fn activate(&self, schedule_id: &str, actor: UserId) -> Result<Schedule, AppError> {
        let schedule = self.get_schedule(schedule_id).await?;
        let existing = self.schedules.find_by_resource(schedule.resource()).await?;

        let result = self
            .transition(schedule, TransitionAction::Activate, |s, now| {
                s.activate(actor, &existing, now)
            })
            .await;
        if let Err(AppError::Domain(DomainError::ConflictBlocked(conflicts))) = &result {
            warn!(
                schedule_id,
                conflicts = conflicts.len(),
                "activation blocked by a live schedule"
            );
        }
        result
    }

    pub async fn deactivate(
        &self,
        schedule_id: &str,
        actor: UserId,
        reason: Option<String>,
    ) -> Result<Schedule, AppError> {
        let schedule = self.get_schedule(schedule_id).await?;
        self.transition(schedule, TransitionAction::Deactivate, |s, now| {
            s.deactivate(actor, reason, now)
        })
        .await
    }

    pub async fn add_exception(
        &self,
        schedule_id: &str,
        exception: ScheduleException,
    ) -> Result<Schedule, AppError> {
        let mut schedule = self.get_schedule(schedule_id).await?;
        let date = exception.date;
        schedule.add_exception(exception, self.clock.now())?;
        self.schedules.save(&schedule).await?;
        info!(schedule_id, %date, "exception added");
        Ok(schedule)
    }

    /// Returns the removed exception, or `None` if the date had none.
    pub async fn remove_exception(
        &self,
        schedule_id: &str,
        date: NaiveDate,
    ) -> Result<Option<ScheduleException>, AppError> {
        let mut schedule = self.get_schedule(schedule_id).await?;
        let removed = schedule.remove_exception(date, self.clock.now());
        if removed.is_some() {
            self.schedules.save(&schedule).await?;
            info!(schedule_id, %date, "exception removed");
        }
        Ok(removed)
    }

    /// Conflicts a stored schedule would raise if approved now.
    pub async fn detect_conflicts(&self, schedule_id: &str) -> Result<Vec<Conflict>, AppError> {
        let schedule = self.get_schedule(schedule_id).await?;
        self.check_conflicts(&schedule).await
    }

    /// Conflicts for a candidate that need not be stored yet.
    pub async fn check_conflicts(&self, candidate: &Schedule) -> Result<Vec<Conflict>, AppError> {
        let existing = self.schedules.find_by_resource(candidate.resource()).await?;
        Ok(detect_conflicts(candidate, &existing))
    }

    /// Applies `operation` to each id independently. One result per id, in
    /// input order; a failing id does not stop the rest.
    pub async fn bulk_apply(
        &self,
        schedule_ids: &[String],
        operation: BulkOperation,
        actor: &UserId,
        reason: Option<&str>,
    ) -> Vec<BulkItemResult> {
        let mut results = Vec::with_capacity(schedule_ids.len());

        for id in schedule_ids {
            let outcome = match operation {
                BulkOperation::Approve => {
                    self.approve(id, actor.clone(), reason.map(str::to_string))
                        .await
                }
                BulkOperation::Reject => {
                    self.reject(id, actor.clone(), reason.unwrap_or_default())
                        .await
                }
                BulkOperation::Activate => self.activate(id, actor.clone()).await,
                BulkOperation::Deactivate => {
                    self.deactivate(id, actor.clone(), reason.map(str::to_string))
                        .await
                }
            };

            results.push(match outcome {
                Ok(schedule) => BulkItemResult {
                    schedule_id: id.clone(),
                    outcome: BulkOutcome::Success,
                    error_code: None,
                    detail: format!(
                        "{} (active: {})",
                        schedule.approval_status(),
                        schedule.is_active()
                    ),
                },
                Err(e) => {
                    warn!(schedule_id = %id, %operation, error = %e, "bulk item failed");
                    BulkItemResult {
                        schedule_id: id.clone(),
                        outcome: BulkOutcome::Error,
                        error_code: Some(e.code().to_string()),
                        detail: e.to_string(),
                    }
                }
            });
        }

        let failed = results.iter().filter(|r| !r.is_success()).count();
        info!(%operation, total = results.len(), failed, "bulk operation finished");
        results
    }

    async fn transition<F>(
        &self,
        mut schedule: Schedule,
        action: TransitionAction,
        apply: F,
    ) -> Result<Schedule, AppError>
    where
        F: FnOnce(&mut Schedule, DateTime<Utc>) -> Result<(), DomainError>,
    {
        let from = schedule.approval_status();
        let recorded = schedule.history().len();
        apply(&mut schedule, self.clock.now())?;

        if schedule.history().len() == recorded {
            debug!(schedule_id = %schedule.id(), %action, "transition was a no-op");
            return Ok(schedule);
        }

        self.schedules.save(&schedule).await?;
        info!(
            schedule_id = %schedule.id(),
            %action,
            %from,
            to = %schedule.approval_status(),
            active = schedule.is_active(),
            "schedule transitioned"
        );
        Ok(schedule)
    }
}
