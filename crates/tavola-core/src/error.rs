use chrono::NaiveDate;
use thiserror::Error;

use crate::conflict::Conflict;
use crate::schedule::{ApprovalStatus, TransitionAction};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },
    #[error("unknown timezone: {0}")]
    InvalidTimezone(String),
    #[error("cannot {requested} a schedule in {current} status")]
    InvalidTransition {
        current: ApprovalStatus,
        requested: TransitionAction,
    },
    #[error("approval blocked by {} conflict(s)", .0.len())]
    ConflictBlocked(Vec<Conflict>),
    #[error("schedule is not approved (status {current})")]
    NotApproved { current: ApprovalStatus },
    #[error("an exception already exists for {0}")]
    DuplicateException(NaiveDate),
    #[error("invalid id: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
