use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::chain::ApprovalPointer;
use crate::workflows::directory::EmployeeId;

/// Identifier wrapper for leave requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaveRequestId(pub String);

impl fmt::Display for LeaveRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveType {
    Sick,
    Vacation,
    Personal,
    Business,
}

impl LeaveType {
    pub const fn ordered() -> [Self; 4] {
        [Self::Sick, Self::Vacation, Self::Personal, Self::Business]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Sick => "SICK",
            Self::Vacation => "VACATION",
            Self::Personal => "PERSONAL",
            Self::Business => "BUSINESS",
        }
    }
}

impl FromStr for LeaveType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase();
        Self::ordered()
            .into_iter()
            .find(|kind| kind.label() == normalized)
            .ok_or_else(|| format!("unknown leave type '{}'", raw.trim()))
    }
}

/// Workflow status. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LeaveStatus::Pending => "PENDING",
            LeaveStatus::Approved => "APPROVED",
            LeaveStatus::Rejected => "REJECTED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

/// Requester-supplied fields for a new leave request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveDraft {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub attachment: Option<String>,
    #[serde(default)]
    pub substitute: Option<EmployeeId>,
}

impl LeaveDraft {
    /// Inclusive day count; zero or negative when the range is inverted.
    pub fn span_days(&self) -> i64 {
        inclusive_days(self.start_date, self.end_date)
    }

    pub fn has_attachment(&self) -> bool {
        self.attachment
            .as_deref()
            .map(|reference| !reference.trim().is_empty())
            .unwrap_or(false)
    }
}

pub(crate) fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Approved,
    Rejected,
}

/// Append-only audit trail entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub actor: EmployeeId,
    pub actor_name: String,
    pub timestamp: NaiveDateTime,
}

impl AuditEntry {
    pub fn summary(&self) -> String {
        match self.action {
            AuditAction::Created => "request created".to_string(),
            AuditAction::Approved => format!("approved by {}", self.actor_name),
            AuditAction::Rejected => format!("rejected by {}", self.actor_name),
        }
    }
}

/// Persisted leave request. Only ever mutated by appending audit entries,
/// advancing the pointer, or a terminal status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: LeaveRequestId,
    pub requester: EmployeeId,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub attachment: Option<String>,
    pub substitute: Option<EmployeeId>,
    pub status: LeaveStatus,
    pub current_approver: ApprovalPointer,
    pub audit_log: Vec<AuditEntry>,
    #[serde(default)]
    pub revision: u64,
}

impl LeaveRequest {
    pub fn span_days(&self) -> i64 {
        inclusive_days(self.start_date, self.end_date)
    }

    pub fn status_view(&self) -> LeaveStatusView {
        LeaveStatusView {
            request_id: self.id.clone(),
            requester: self.requester.clone(),
            leave_type: self.leave_type,
            start_date: self.start_date,
            end_date: self.end_date,
            days: self.span_days(),
            status: self.status.label(),
            current_approver: self.current_approver.clone(),
            history: self.audit_log.iter().map(AuditEntry::summary).collect(),
        }
    }
}

/// Outward representation of a request for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct LeaveStatusView {
    pub request_id: LeaveRequestId,
    pub requester: EmployeeId,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i64,
    pub status: &'static str,
    pub current_approver: ApprovalPointer,
    pub history: Vec<String>,
}
