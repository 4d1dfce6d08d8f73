//! Lifecycle of a schedule from draft to live.
//!
//! `approval_status` only ever moves Draft -> PendingApproval -> Approved or
//! Rejected. Whether an approved schedule is live is the separate
//! `is_active` flag. Every transition checks its guards before touching
//! the schedule, so a failed call leaves it exactly as it was.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::{activation_conflicts, detect_conflicts};
use crate::error::DomainError;
use crate::ids::UserId;
use crate::schedule::Schedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Draft,
    PendingApproval,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::PendingApproval => "PENDING_APPROVAL",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionAction {
    Submit,
    Approve,
    Reject,
    Activate,
    Deactivate,
}

impl fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
        };
        f.write_str(verb)
    }
}

/// One entry of a schedule's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTransition {
    pub action: TransitionAction,
    pub from: ApprovalStatus,
    pub to: ApprovalStatus,
    pub is_active: bool,
    pub actor: UserId,
    pub comment: Option<String>,
    pub at: DateTime<Utc>,
}

impl Schedule {
    pub fn submit_for_approval(
        &mut self,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.expect_status(ApprovalStatus::Draft, TransitionAction::Submit)?;
        self.move_to(ApprovalStatus::PendingApproval, TransitionAction::Submit, actor, None, now);
        Ok(())
    }

    /// Approves a pending schedule unless it conflicts with any of
    /// `existing`. Approval does not activate.
    pub fn approve(
        &mut self,
        approver: UserId,
        comments: Option<String>,
        existing: &[Schedule],
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.expect_status(ApprovalStatus::PendingApproval, TransitionAction::Approve)?;
        let conflicts = detect_conflicts(self, existing);
        if !conflicts.is_empty() {
            return Err(DomainError::ConflictBlocked(conflicts));
        }

        self.approved_by = Some(approver.clone());
        self.approved_at = Some(now);
        self.approval_comments = comments.clone();
        self.move_to(ApprovalStatus::Approved, TransitionAction::Approve, approver, comments, now);
        Ok(())
    }

    pub fn reject(
        &mut self,
        actor: UserId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.expect_status(ApprovalStatus::PendingApproval, TransitionAction::Reject)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::validation("reason", "must not be blank"));
        }

        self.rejection_reason = Some(reason.to_string());
        self.move_to(
            ApprovalStatus::Rejected,
            TransitionAction::Reject,
            actor,
            Some(reason.to_string()),
            now,
        );
        Ok(())
    }

    /// Makes an approved schedule live, unless another schedule in
    /// `existing` is already live for the same resource over an overlapping
    /// effective window. Activating a live schedule is a no-op.
    pub fn activate(
        &mut self,
        actor: UserId,
        existing: &[Schedule],
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.approval_status != ApprovalStatus::Approved {
            return Err(DomainError::NotApproved {
                current: self.approval_status,
            });
        }
        if self.is_active {
            return Ok(());
        }
        let conflicts = activation_conflicts(self, existing);
        if !conflicts.is_empty() {
            return Err(DomainError::ConflictBlocked(conflicts));
        }

        self.is_active = true;
        self.move_to(self.approval_status, TransitionAction::Activate, actor, None, now);
        Ok(())
    }

    /// Takes a schedule offline. Deactivating an inactive schedule is a no-op.
    pub fn deactivate(
        &mut self,
        actor: UserId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if !self.is_active {
            return Ok(());
        }

        self.is_active = false;
        self.move_to(self.approval_status, TransitionAction::Deactivate, actor, reason, now);
        Ok(())
    }

    fn expect_status(
        &self,
        expected: ApprovalStatus,
        requested: TransitionAction,
    ) -> Result<(), DomainError> {
        if self.approval_status == expected {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition {
                current: self.approval_status,
                requested,
            })
        }
    }

    fn move_to(
        &mut self,
        to: ApprovalStatus,
        action: TransitionAction,
        actor: UserId,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.history.push(ScheduleTransition {
            action,
            from: self.approval_status,
            to,
            is_active: self.is_active,
            actor,
            comment,
            at: now,
        });
        self.approval_status = to;
        self.updated_at = now;
    }
}
