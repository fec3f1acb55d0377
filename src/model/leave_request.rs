use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    Approve,
    Reject,
}

impl LeaveDecision {
    pub fn resulting_status(&self) -> LeaveStatus {
        match self {
            LeaveDecision::Approve => LeaveStatus::Approved,
            LeaveDecision::Reject => LeaveStatus::Rejected,
        }
    }
}

/// Pending approval task attached to a leave request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveApprovalTask {
    pub leave_id: u64,
    pub requester_id: u64,
    pub requester_department: String,
    pub status: LeaveStatus,
    /// Employee id of the approver already holding this task, if any.
    pub assigned_approver_id: Option<u64>,
}
