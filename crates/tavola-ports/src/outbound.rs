use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tavola_core::schedule::{ResourceRef, Schedule};

use crate::error::PortError;

/// Storage for schedules. Implementations serialize read-modify-write
/// cycles per schedule id; the services do not lock.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn save(&self, schedule: &Schedule) -> Result<(), PortError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Schedule>, PortError>;
    async fn find_by_resource(&self, resource: &ResourceRef) -> Result<Vec<Schedule>, PortError>;
    async fn list_all(&self) -> Result<Vec<Schedule>, PortError>;
}

/// Source of "now". Nothing in the engine reads the system clock directly.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
