//! Leave requests: quota admission, approval chain resolution, and the
//! PENDING to APPROVED/REJECTED workflow with its audit trail.

pub mod chain;
pub mod domain;
pub mod engine;
pub mod quota;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use chain::{ApprovalChain, ApprovalChainResolver, ApprovalPointer, ApproverRef};
pub use domain::{
    AuditAction, AuditEntry, LeaveDraft, LeaveRequest, LeaveRequestId, LeaveStatus,
    LeaveStatusView, LeaveType,
};
pub use engine::{
    ApprovalOutcome, ChainDriftPolicy, LeaveWorkflowEngine, Transition, TransitionError,
    FALLBACK_APPROVER,
};
pub use quota::{
    AdmissionError, LeaveQuotaCalculator, QuotaSummary, QuotaTable,
    MEDICAL_CERTIFICATE_THRESHOLD_DAYS,
};
pub use repository::LeaveRepository;
pub use router::leave_router;
pub use service::{ApprovalProgress, ApprovalStep, LeaveService, LeaveServiceError, StepState};
