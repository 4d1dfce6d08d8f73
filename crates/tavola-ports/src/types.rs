use std::fmt;

use serde::{Deserialize, Serialize};

use tavola_core::schedule::ResourceRef;

/// What an availability query is asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityTarget {
    Schedule(String),
    Resource(ResourceRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BulkOperation {
    Approve,
    Reject,
    Activate,
    Deactivate,
}

impl BulkOperation {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" => Some(Self::Approve),
            "reject" => Some(Self::Reject),
            "activate" => Some(Self::Activate),
            "deactivate" => Some(Self::Deactivate),
            _ => None,
        }
    }
}

impl fmt::Display for BulkOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkOutcome {
    Success,
    Error,
}

/// Result for one id of a bulk request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemResult {
    pub schedule_id: String,
    pub outcome: BulkOutcome,
    /// Machine-readable error kind, e.g. `NOT_APPROVED`. Absent on success.
    pub error_code: Option<String>,
    pub detail: String,
}

impl BulkItemResult {
    pub fn is_success(&self) -> bool {
        self.outcome == BulkOutcome::Success
    }
}
