use super::domain::{LeaveRequest, LeaveRequestId};
use crate::workflows::directory::EmployeeId;
use crate::workflows::repository::RepositoryError;

/// Storage abstraction for leave requests.
///
/// Approve and reject are read-modify-write cycles. `update` must compare
/// the incoming `revision` with the stored one and refuse a stale write with
/// [`RepositoryError::Conflict`]; otherwise two approvers racing on the same
/// request can silently overwrite each other. On success it returns the
/// stored request with the revision incremented.
pub trait LeaveRepository: Send + Sync {
    fn insert(&self, request: LeaveRequest) -> Result<LeaveRequest, RepositoryError>;
    fn update(&self, request: LeaveRequest) -> Result<LeaveRequest, RepositoryError>;
    fn fetch(&self, id: &LeaveRequestId) -> Result<Option<LeaveRequest>, RepositoryError>;
    fn for_requester(&self, requester: &EmployeeId) -> Result<Vec<LeaveRequest>, RepositoryError>;
    /// All PENDING requests, oldest first.
    fn pending(&self) -> Result<Vec<LeaveRequest>, RepositoryError>;
}
