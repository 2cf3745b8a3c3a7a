use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::config::WorkflowConfig;
use crate::workflows::directory::{
    AttendanceCondition, DirectoryRepository, Employee, EmployeeId, LocationZone, Role, Shift,
    ShiftId,
};
use crate::workflows::leave::{
    LeaveDraft, LeaveRepository, LeaveRequest, LeaveRequestId, LeaveService, LeaveStatus,
    LeaveType,
};
use crate::workflows::repository::RepositoryError;

pub(super) fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).expect("valid date")
}

pub(super) fn now() -> NaiveDateTime {
    date(11, 18).and_hms_opt(9, 0, 0).expect("valid time")
}

pub(super) fn id(raw: &str) -> EmployeeId {
    EmployeeId::new(raw)
}

pub(super) fn staff() -> Vec<Employee> {
    vec![
        Employee::new("u1", "Somchai", Role::Ceo, AttendanceCondition::Exempt),
        Employee::new("u2", "Somying", Role::Admin, AttendanceCondition::Flexible),
        Employee::new("u6", "Wipada", Role::OfficeManager, AttendanceCondition::Flexible),
        Employee::new("u3", "Somsak", Role::Supervisor, AttendanceCondition::Shift),
        Employee::new("u4", "Anan", Role::Supervisor, AttendanceCondition::Shift),
        Employee::new("u5", "Mind", Role::Employee, AttendanceCondition::Shift)
            .with_approvers([Some(id("u3")), None, None]),
        Employee::new("u7", "Ploy", Role::Employee, AttendanceCondition::Shift),
    ]
}

#[derive(Clone)]
pub(super) struct MemoryDirectory {
    employees: Arc<Mutex<HashMap<EmployeeId, Employee>>>,
}

impl MemoryDirectory {
    pub(super) fn seeded() -> Self {
        Self {
            employees: Arc::new(Mutex::new(
                staff()
                    .into_iter()
                    .map(|employee| (employee.id.clone(), employee))
                    .collect(),
            )),
        }
    }

    /// Admin edit of an employee's approver slots.
    pub(super) fn reassign(&self, employee: &str, approvers: [Option<EmployeeId>; 3]) {
        let mut guard = self.employees.lock().expect("directory mutex poisoned");
        if let Some(entry) = guard.get_mut(&id(employee)) {
            entry.approvers = approvers;
        }
    }
}

impl DirectoryRepository for MemoryDirectory {
    fn employee(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        let guard = self.employees.lock().expect("directory mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn shift(&self, _id: &ShiftId) -> Result<Option<Shift>, RepositoryError> {
        Ok(None)
    }

    fn zones(&self) -> Result<Vec<LocationZone>, RepositoryError> {
        Ok(Vec::new())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryLeave {
    requests: Arc<Mutex<Vec<LeaveRequest>>>,
}

impl MemoryLeave {
    pub(super) fn seed(&self, request: LeaveRequest) {
        self.requests
            .lock()
            .expect("repository mutex poisoned")
            .push(request);
    }

    pub(super) fn stored(&self, request_id: &LeaveRequestId) -> Option<LeaveRequest> {
        self.requests
            .lock()
            .expect("repository mutex poisoned")
            .iter()
            .find(|request| request.id == *request_id)
            .cloned()
    }
}

impl LeaveRepository for MemoryLeave {
    fn insert(&self, request: LeaveRequest) -> Result<LeaveRequest, RepositoryError> {
        let mut guard = self.requests.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.id == request.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(request.clone());
        Ok(request)
    }

    fn update(&self, mut request: LeaveRequest) -> Result<LeaveRequest, RepositoryError> {
        let mut guard = self.requests.lock().expect("repository mutex poisoned");
        let stored = guard
            .iter_mut()
            .find(|existing| existing.id == request.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.revision != request.revision {
            return Err(RepositoryError::Conflict);
        }
        request.revision += 1;
        *stored = request.clone();
        Ok(request)
    }

    fn fetch(&self, id: &LeaveRequestId) -> Result<Option<LeaveRequest>, RepositoryError> {
        let guard = self.requests.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|request| request.id == *id).cloned())
    }

    fn for_requester(&self, requester: &EmployeeId) -> Result<Vec<LeaveRequest>, RepositoryError> {
        let guard = self.requests.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|request| request.requester == *requester)
            .cloned()
            .collect())
    }

    fn pending(&self) -> Result<Vec<LeaveRequest>, RepositoryError> {
        let guard = self.requests.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|request| request.status == LeaveStatus::Pending)
            .cloned()
            .collect())
    }
}

pub(super) struct UnavailableLeave;

impl LeaveRepository for UnavailableLeave {
    fn insert(&self, _request: LeaveRequest) -> Result<LeaveRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _request: LeaveRequest) -> Result<LeaveRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &LeaveRequestId) -> Result<Option<LeaveRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_requester(&self, _requester: &EmployeeId) -> Result<Vec<LeaveRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn pending(&self) -> Result<Vec<LeaveRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn vacation(start: NaiveDate, end: NaiveDate) -> LeaveDraft {
    LeaveDraft {
        leave_type: LeaveType::Vacation,
        start_date: start,
        end_date: end,
        reason: "family trip".to_string(),
        attachment: None,
        substitute: None,
    }
}

pub(super) fn build_service() -> (
    LeaveService<MemoryDirectory, MemoryLeave>,
    Arc<MemoryDirectory>,
    Arc<MemoryLeave>,
) {
    build_service_with(WorkflowConfig::default())
}

pub(super) fn build_service_with(
    config: WorkflowConfig,
) -> (
    LeaveService<MemoryDirectory, MemoryLeave>,
    Arc<MemoryDirectory>,
    Arc<MemoryLeave>,
) {
    let directory = Arc::new(MemoryDirectory::seeded());
    let requests = Arc::new(MemoryLeave::default());
    let service = LeaveService::new(directory.clone(), requests.clone(), &config);
    (service, directory, requests)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 8192)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
