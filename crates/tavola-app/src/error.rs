use tavola_core::error::DomainError;
use tavola_ports::error::PortError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("port error: {0}")]
    Port(#[from] PortError),
    #[error("no active schedule governs {0}")]
    NoActiveSchedule(String),
}

impl AppError {
    /// Stable machine-readable kind, for callers rendering failures.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Domain(e) => match e {
                DomainError::Validation { .. } => "VALIDATION_ERROR",
                DomainError::InvalidTimezone(_) => "INVALID_TIMEZONE",
                DomainError::InvalidTransition { .. } => "INVALID_TRANSITION",
                DomainError::ConflictBlocked(_) => "CONFLICT_BLOCKED",
                DomainError::NotApproved { .. } => "NOT_APPROVED",
                DomainError::DuplicateException(_) => "DUPLICATE_EXCEPTION",
                DomainError::InvalidId(_) => "INVALID_ID",
            },
            Self::Port(e) => match e {
                PortError::NotFound => "NOT_FOUND",
                PortError::Persistence(_) => "PERSISTENCE_ERROR",
                PortError::Connection(_) => "CONNECTION_ERROR",
            },
            Self::NoActiveSchedule(_) => "NO_ACTIVE_SCHEDULE",
        }
    }
}
