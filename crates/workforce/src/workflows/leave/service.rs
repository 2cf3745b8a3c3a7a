use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::chain::{ApprovalChain, ApprovalChainResolver, ApprovalPointer, ApproverRef};
use super::domain::{LeaveDraft, LeaveRequest, LeaveRequestId, LeaveStatus, LeaveType};
use super::engine::{ApprovalOutcome, LeaveWorkflowEngine, Transition, TransitionError};
use super::quota::{AdmissionError, LeaveQuotaCalculator, QuotaSummary};
use super::repository::LeaveRepository;
use crate::config::WorkflowConfig;
use crate::workflows::directory::{
    authenticate, AuthError, Caller, Capability, DirectoryRepository, Employee, EmployeeId,
    PermissionTable,
};
use crate::workflows::repository::RepositoryError;

/// Service orchestrating admission, chain resolution, and state transitions.
pub struct LeaveService<D, L> {
    directory: Arc<D>,
    requests: Arc<L>,
    resolver: ApprovalChainResolver,
    engine: LeaveWorkflowEngine,
    calculator: LeaveQuotaCalculator,
    permissions: PermissionTable,
}

static LEAVE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> LeaveRequestId {
    let id = LEAVE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LeaveRequestId(format!("leave-{id:06}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Completed,
    Current,
    Rejected,
    Upcoming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalStep {
    pub approver: ApproverRef,
    pub state: StepState,
}

/// Per-step view of a request against the requester's current chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalProgress {
    pub request_id: LeaveRequestId,
    pub status: LeaveStatus,
    pub steps: Vec<ApprovalStep>,
}

impl<D, L> LeaveService<D, L>
where
    D: DirectoryRepository + 'static,
    L: LeaveRepository + 'static,
{
    pub fn new(directory: Arc<D>, requests: Arc<L>, config: &WorkflowConfig) -> Self {
        Self::with_parts(
            directory,
            requests,
            LeaveWorkflowEngine::new(config.chain_drift),
            LeaveQuotaCalculator::default(),
            config.permissions.clone(),
        )
    }

    pub fn with_parts(
        directory: Arc<D>,
        requests: Arc<L>,
        engine: LeaveWorkflowEngine,
        calculator: LeaveQuotaCalculator,
        permissions: PermissionTable,
    ) -> Self {
        Self {
            directory,
            requests,
            resolver: ApprovalChainResolver,
            engine,
            calculator,
            permissions,
        }
    }

    /// Current approval chain for `employee_id`, resolved fresh.
    pub fn resolve_chain(&self, employee_id: &EmployeeId) -> Result<ApprovalChain, LeaveServiceError> {
        let employee = self.employee(employee_id)?;
        Ok(self.chain_for(&employee))
    }

    /// Admission-check and persist a new PENDING request for the caller.
    pub fn submit(
        &self,
        caller: Option<&EmployeeId>,
        draft: LeaveDraft,
        now: NaiveDateTime,
    ) -> Result<LeaveRequest, LeaveServiceError> {
        let employee = authenticate(self.directory.as_ref(), caller)?;
        self.check_substitute(&employee, &draft)?;
        let history = self.requests.for_requester(&employee.id)?;
        let summary = self.calculator.admit(&draft, &history).map_err(|error| {
            info!(employee = %employee.id, %error, "leave admission refused");
            error
        })?;

        let chain = self.chain_for(&employee);
        let request = self.engine.open(
            next_request_id(),
            &Caller::from(&employee),
            draft,
            &chain,
            now,
        );
        let stored = self.requests.insert(request)?;

        info!(
            request = %stored.id,
            employee = %employee.id,
            leave_type = stored.leave_type.label(),
            days = stored.span_days(),
            remaining = summary.available - stored.span_days(),
            approver = %stored.current_approver,
            "leave request submitted"
        );
        Ok(stored)
    }

    /// Approve the current step. Callers must hold the pointer or the
    /// override capability, and may never approve their own request.
    pub fn approve(
        &self,
        caller: Option<&EmployeeId>,
        request_id: &LeaveRequestId,
        now: NaiveDateTime,
    ) -> Result<Transition, LeaveServiceError> {
        let actor = Caller::from(&authenticate(self.directory.as_ref(), caller)?);
        let request = self.pending_request(request_id)?;
        if actor.employee_id == request.requester {
            return Err(LeaveServiceError::SelfApproval(actor.employee_id));
        }
        self.authorize(&actor, &request)?;

        let requester = self.employee(&request.requester)?;
        let chain = self.chain_for(&requester);
        let previous = request.current_approver.clone();
        let transition = self.engine.approve(request, &chain, &actor, now)?;

        if let ApprovalOutcome::DriftRecovered { next } = &transition.outcome {
            warn!(
                request = %transition.request.id,
                stale = %previous,
                next = %next,
                policy = %self.engine.drift_policy(),
                "approver missing from current chain; recovered"
            );
        }

        let stored = self.requests.update(transition.request)?;
        info!(
            request = %stored.id,
            actor = %actor.employee_id,
            status = stored.status.label(),
            approver = %stored.current_approver,
            "leave request approved"
        );
        Ok(Transition {
            request: stored,
            outcome: transition.outcome,
        })
    }

    pub fn reject(
        &self,
        caller: Option<&EmployeeId>,
        request_id: &LeaveRequestId,
        now: NaiveDateTime,
    ) -> Result<LeaveRequest, LeaveServiceError> {
        let actor = Caller::from(&authenticate(self.directory.as_ref(), caller)?);
        let request = self.pending_request(request_id)?;
        self.authorize(&actor, &request)?;

        let rejected = self.engine.reject(request, &actor, now)?;
        let stored = self.requests.update(rejected)?;
        info!(request = %stored.id, actor = %actor.employee_id, "leave request rejected");
        Ok(stored)
    }

    pub fn quota(
        &self,
        employee_id: &EmployeeId,
        leave_type: LeaveType,
        year: i32,
    ) -> Result<QuotaSummary, LeaveServiceError> {
        let employee = self.employee(employee_id)?;
        let history = self.requests.for_requester(&employee.id)?;
        Ok(self.calculator.summarize(&history, leave_type, year))
    }

    /// Summaries for every leave type in `year`.
    pub fn quotas(
        &self,
        employee_id: &EmployeeId,
        year: i32,
    ) -> Result<Vec<QuotaSummary>, LeaveServiceError> {
        let employee = self.employee(employee_id)?;
        let history = self.requests.for_requester(&employee.id)?;
        Ok(LeaveType::ordered()
            .into_iter()
            .map(|leave_type| self.calculator.summarize(&history, leave_type, year))
            .collect())
    }

    /// PENDING requests whose pointer names the caller or the caller's role.
    pub fn pending_for(
        &self,
        caller: Option<&EmployeeId>,
    ) -> Result<Vec<LeaveRequest>, LeaveServiceError> {
        let actor = Caller::from(&authenticate(self.directory.as_ref(), caller)?);
        Ok(self
            .requests
            .pending()?
            .into_iter()
            .filter(|request| request.requester != actor.employee_id)
            .filter(|request| request.current_approver.is_held_by(&actor))
            .collect())
    }

    pub fn requests_for(
        &self,
        caller: Option<&EmployeeId>,
    ) -> Result<Vec<LeaveRequest>, LeaveServiceError> {
        let employee = authenticate(self.directory.as_ref(), caller)?;
        Ok(self.requests.for_requester(&employee.id)?)
    }

    pub fn get(&self, request_id: &LeaveRequestId) -> Result<LeaveRequest, LeaveServiceError> {
        self.requests
            .fetch(request_id)?
            .ok_or_else(|| LeaveServiceError::RequestNotFound(request_id.clone()))
    }

    pub fn progress(&self, request_id: &LeaveRequestId) -> Result<ApprovalProgress, LeaveServiceError> {
        let request = self.get(request_id)?;
        let requester = self.employee(&request.requester)?;
        let chain = self.chain_for(&requester);
        let current = chain.position(&request.current_approver);

        let steps = chain
            .iter()
            .enumerate()
            .map(|(index, approver)| ApprovalStep {
                approver: approver.clone(),
                state: step_state(request.status, current, index),
            })
            .collect();

        Ok(ApprovalProgress {
            request_id: request.id,
            status: request.status,
            steps,
        })
    }

    fn chain_for(&self, employee: &Employee) -> ApprovalChain {
        let chain = self.resolver.resolve(employee);
        debug!(employee = %employee.id, steps = chain.len(), "approval chain resolved");
        chain
    }

    /// A substitute must be another employee known to the directory.
    fn check_substitute(&self, employee: &Employee, draft: &LeaveDraft) -> Result<(), LeaveServiceError> {
        let Some(substitute) = draft.substitute.as_ref() else {
            return Ok(());
        };
        if *substitute == employee.id {
            return Err(LeaveServiceError::SelfSubstitute(substitute.clone()));
        }
        if self.directory.employee(substitute)?.is_none() {
            return Err(LeaveServiceError::SubstituteNotFound(substitute.clone()));
        }
        Ok(())
    }

    fn employee(&self, employee_id: &EmployeeId) -> Result<Employee, LeaveServiceError> {
        self.directory
            .employee(employee_id)?
            .ok_or_else(|| LeaveServiceError::EmployeeNotFound(employee_id.clone()))
    }

    /// Loads the request, refusing terminal ones before any authorization.
    fn pending_request(&self, request_id: &LeaveRequestId) -> Result<LeaveRequest, LeaveServiceError> {
        let request = self.get(request_id)?;
        if request.status.is_terminal() {
            return Err(TransitionError::AlreadyFinalized {
                status: request.status,
            }
            .into());
        }
        Ok(request)
    }

    fn authorize(&self, actor: &Caller, request: &LeaveRequest) -> Result<(), LeaveServiceError> {
        if request.current_approver.is_held_by(actor) {
            return Ok(());
        }
        if self
            .permissions
            .allows(actor.role, Capability::OverrideApproval)
        {
            info!(
                request = %request.id,
                actor = %actor.employee_id,
                role = %actor.role,
                "approval override"
            );
            return Ok(());
        }

        Err(LeaveServiceError::NotCurrentApprover {
            caller: actor.employee_id.clone(),
            pointer: request.current_approver.clone(),
        })
    }
}

fn step_state(status: LeaveStatus, current: Option<usize>, index: usize) -> StepState {
    match (status, current) {
        (LeaveStatus::Approved, _) => StepState::Completed,
        (_, Some(current)) if index < current => StepState::Completed,
        (LeaveStatus::Pending, Some(current)) if index == current => StepState::Current,
        (LeaveStatus::Rejected, Some(current)) if index == current => StepState::Rejected,
        _ => StepState::Upcoming,
    }
}

/// Error raised by the leave service.
#[derive(Debug, thiserror::Error)]
pub enum LeaveServiceError {
    #[error("not authenticated")]
    Unauthenticated,
    #[error("employee {0} not found")]
    EmployeeNotFound(EmployeeId),
    #[error("leave request {0} not found")]
    RequestNotFound(LeaveRequestId),
    #[error("{caller} is not the current approver ({pointer})")]
    NotCurrentApprover {
        caller: EmployeeId,
        pointer: ApprovalPointer,
    },
    #[error("{0} cannot approve their own request")]
    SelfApproval(EmployeeId),
    #[error("{0} cannot be their own substitute")]
    SelfSubstitute(EmployeeId),
    #[error("substitute {0} not found")]
    SubstituteNotFound(EmployeeId),
    #[error(transparent)]
    Admission(#[from] AdmissionError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<AuthError> for LeaveServiceError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::Unauthenticated => Self::Unauthenticated,
            AuthError::UnknownEmployee(id) => Self::EmployeeNotFound(id),
            AuthError::Repository(err) => Self::Repository(err),
        }
    }
}
