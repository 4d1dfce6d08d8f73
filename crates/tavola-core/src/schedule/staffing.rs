use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Staff assigned to work a schedule's hours, as reported by an external
/// staffing system. Only used to surface staff conflicts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffingInfo {
    pub staff: Vec<UserId>,
}

impl StaffingInfo {
    pub fn new(staff: Vec<UserId>) -> Self {
        Self { staff }
    }

    pub fn shared_with(&self, other: &StaffingInfo) -> Vec<UserId> {
        self.staff
            .iter()
            .filter(|s| other.staff.contains(s))
            .cloned()
            .collect()
    }
}
