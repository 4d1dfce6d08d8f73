use chrono::{DateTime, Utc};
use tracing::debug;

use tavola_core::availability::{Availability, Evaluator};
use tavola_core::ids::ScheduleId;
use tavola_core::schedule::{ResourceRef, Schedule};
use tavola_core::time;
use tavola_ports::error::PortError;
use tavola_ports::outbound::{Clock, ScheduleRepository};
use tavola_ports::types::AvailabilityTarget;

use crate::error::AppError;

/// Query surface: "is this open at T".
pub struct AvailabilityService<S, C>
where
    S: ScheduleRepository,
    C: Clock,
{
    schedules: S,
    clock: C,
    evaluator: Evaluator,
}

impl<S, C> AvailabilityService<S, C>
where
    S: ScheduleRepository,
    C: Clock,
{
    pub fn new(schedules: S, clock: C, evaluator: Evaluator) -> Self {
        Self {
            schedules,
            clock,
            evaluator,
        }
    }

    /// Evaluates `target` at `at`, or at the clock's current time.
    pub async fn evaluate(
        &self,
        target: &AvailabilityTarget,
        at: Option<DateTime<Utc>>,
    ) -> Result<Availability, AppError> {
        let at = at.unwrap_or_else(|| self.clock.now());
        let schedule = match target {
            AvailabilityTarget::Schedule(id) => {
                let id = ScheduleId::parse(id)?;
                self.schedules
                    .find_by_id(&id.to_string())
                    .await?
                    .ok_or(AppError::Port(PortError::NotFound))?
            }
            AvailabilityTarget::Resource(resource) => {
                self.governing_schedule(resource, at).await?
            }
        };

        let availability = self.evaluator.evaluate(&schedule, at)?;
        debug!(
            schedule_id = %schedule.id(),
            %at,
            status = ?availability.status,
            "availability evaluated"
        );
        Ok(availability)
    }

    /// The live schedule in force for `resource` at `at`. Activation keeps
    /// this to one per date; rows imported from the old dashboard can still
    /// overlap, in which case the most recently approved wins.
    pub async fn governing_schedule(
        &self,
        resource: &ResourceRef,
        at: DateTime<Utc>,
    ) -> Result<Schedule, AppError> {
        self.schedules
            .find_by_resource(resource)
            .await?
            .into_iter()
            .filter(|s| {
                s.is_active() && s.is_effective_on(time::normalize_in(at, *s.timezone()).date)
            })
            .max_by_key(|s| s.approved_at())
            .ok_or_else(|| AppError::NoActiveSchedule(resource.to_string()))
    }
}
