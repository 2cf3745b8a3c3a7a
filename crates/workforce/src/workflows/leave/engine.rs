use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::chain::{ApprovalChain, ApprovalPointer};
use super::domain::{
    AuditAction, AuditEntry, LeaveDraft, LeaveRequest, LeaveRequestId, LeaveStatus,
};
use crate::workflows::directory::{Caller, Role};

/// Approver used when a requester's chain resolves to nothing.
pub const FALLBACK_APPROVER: Role = Role::Admin;

/// What `approve` does when the stored pointer is no longer part of the
/// requester's freshly resolved chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainDriftPolicy {
    /// Treat the call as approving step 0 and move to index 1, completing
    /// when the chain has at most one step.
    #[default]
    AdvanceToSecond,
    /// Move the pointer back to the first step without completing.
    RestartAtFirst,
    /// Refuse the transition with [`TransitionError::ChainDrift`].
    Fail,
}

impl ChainDriftPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            ChainDriftPolicy::AdvanceToSecond => "advance_to_second",
            ChainDriftPolicy::RestartAtFirst => "restart_at_first",
            ChainDriftPolicy::Fail => "fail",
        }
    }
}

impl fmt::Display for ChainDriftPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainDriftPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "advance_to_second" => Ok(ChainDriftPolicy::AdvanceToSecond),
            "restart_at_first" => Ok(ChainDriftPolicy::RestartAtFirst),
            "fail" => Ok(ChainDriftPolicy::Fail),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ApprovalOutcome {
    /// Pointer moved to the next step; request stays pending.
    Advanced { next: ApprovalPointer },
    /// Last step approved; request is now APPROVED.
    Completed,
    /// Pointer was not found in the current chain and the drift policy
    /// chose `next`. `Completed` here means the request was approved.
    DriftRecovered { next: ApprovalPointer },
}

/// New request state produced by an approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub request: LeaveRequest,
    pub outcome: ApprovalOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("leave request already {}", .status.label())]
    AlreadyFinalized { status: LeaveStatus },
    #[error("approver {pointer} is no longer part of the requester's chain")]
    ChainDrift { pointer: ApprovalPointer },
}

/// Pure state machine over leave requests. It never checks whether the actor
/// matches the current pointer; callers gate that.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaveWorkflowEngine {
    drift_policy: ChainDriftPolicy,
}

impl LeaveWorkflowEngine {
    pub fn new(drift_policy: ChainDriftPolicy) -> Self {
        Self { drift_policy }
    }

    pub fn drift_policy(&self) -> ChainDriftPolicy {
        self.drift_policy
    }

    /// Build a PENDING request pointing at the first step of `chain`.
    pub fn open(
        &self,
        id: LeaveRequestId,
        requester: &Caller,
        draft: LeaveDraft,
        chain: &ApprovalChain,
        now: NaiveDateTime,
    ) -> LeaveRequest {
        let current_approver = chain
            .first()
            .cloned()
            .map(ApprovalPointer::from)
            .unwrap_or(ApprovalPointer::Role(FALLBACK_APPROVER));

        LeaveRequest {
            id,
            requester: requester.employee_id.clone(),
            leave_type: draft.leave_type,
            start_date: draft.start_date,
            end_date: draft.end_date,
            reason: draft.reason,
            attachment: draft.attachment,
            substitute: draft.substitute,
            status: LeaveStatus::Pending,
            current_approver,
            audit_log: vec![audit(AuditAction::Created, requester, now)],
            revision: 0,
        }
    }

    pub fn approve(
        &self,
        mut request: LeaveRequest,
        chain: &ApprovalChain,
        actor: &Caller,
        now: NaiveDateTime,
    ) -> Result<Transition, TransitionError> {
        ensure_pending(&request)?;

        let outcome = match chain.position(&request.current_approver) {
            Some(index) => match chain.get(index + 1) {
                Some(next) => ApprovalOutcome::Advanced {
                    next: ApprovalPointer::from(next.clone()),
                },
                None => ApprovalOutcome::Completed,
            },
            None => ApprovalOutcome::DriftRecovered {
                next: self.recover(&request.current_approver, chain)?,
            },
        };

        match &outcome {
            ApprovalOutcome::Advanced { next } => request.current_approver = next.clone(),
            ApprovalOutcome::Completed => complete(&mut request),
            ApprovalOutcome::DriftRecovered { next } => {
                if *next == ApprovalPointer::Completed {
                    complete(&mut request);
                } else {
                    request.current_approver = next.clone();
                }
            }
        }
        request
            .audit_log
            .push(audit(AuditAction::Approved, actor, now));

        Ok(Transition { request, outcome })
    }

    /// Terminate the request as REJECTED from whichever step is current.
    pub fn reject(
        &self,
        mut request: LeaveRequest,
        actor: &Caller,
        now: NaiveDateTime,
    ) -> Result<LeaveRequest, TransitionError> {
        ensure_pending(&request)?;
        request.status = LeaveStatus::Rejected;
        request
            .audit_log
            .push(audit(AuditAction::Rejected, actor, now));
        Ok(request)
    }

    fn recover(
        &self,
        pointer: &ApprovalPointer,
        chain: &ApprovalChain,
    ) -> Result<ApprovalPointer, TransitionError> {
        let next = match self.drift_policy {
            ChainDriftPolicy::AdvanceToSecond => chain.get(1),
            ChainDriftPolicy::RestartAtFirst => chain.first(),
            ChainDriftPolicy::Fail => {
                return Err(TransitionError::ChainDrift {
                    pointer: pointer.clone(),
                })
            }
        };

        Ok(next
            .cloned()
            .map(ApprovalPointer::from)
            .unwrap_or(ApprovalPointer::Completed))
    }
}

fn ensure_pending(request: &LeaveRequest) -> Result<(), TransitionError> {
    if request.status.is_terminal() {
        return Err(TransitionError::AlreadyFinalized {
            status: request.status,
        });
    }
    Ok(())
}

fn complete(request: &mut LeaveRequest) {
    request.status = LeaveStatus::Approved;
    request.current_approver = ApprovalPointer::Completed;
}

fn audit(action: AuditAction, actor: &Caller, timestamp: NaiveDateTime) -> AuditEntry {
    AuditEntry {
        action,
        actor: actor.employee_id.clone(),
        actor_name: actor.name.clone(),
        timestamp,
    }
}
