pub mod availability_service;
pub mod error;
pub mod schedule_service;

#[cfg(test)]
mod testing;
