pub mod availability;
pub mod conflict;
pub mod error;
pub mod ids;
pub mod schedule;
pub mod time;
