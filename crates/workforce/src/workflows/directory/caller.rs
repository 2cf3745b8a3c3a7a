use serde::{Deserialize, Serialize};

use super::domain::{Employee, EmployeeId, Role};
use super::repository::DirectoryRepository;
use crate::workflows::repository::RepositoryError;

/// Authenticated identity performing a mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub employee_id: EmployeeId,
    pub name: String,
    pub role: Role,
}

impl From<&Employee> for Caller {
    fn from(employee: &Employee) -> Self {
        Self {
            employee_id: employee.id.clone(),
            name: employee.name.clone(),
            role: employee.role,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("not authenticated")]
    Unauthenticated,
    #[error("employee {0} not found")]
    UnknownEmployee(EmployeeId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Resolve the acting employee from the identity supplied by the transport.
///
/// The role is always taken from the directory rather than the caller.
pub fn authenticate<D>(
    directory: &D,
    employee_id: Option<&EmployeeId>,
) -> Result<Employee, AuthError>
where
    D: DirectoryRepository + ?Sized,
{
    let employee_id = employee_id.ok_or(AuthError::Unauthenticated)?;
    directory
        .employee(employee_id)?
        .ok_or_else(|| AuthError::UnknownEmployee(employee_id.clone()))
}

/// Header carrying the authenticated employee id from the gateway.
pub const CALLER_HEADER: &str = "x-employee-id";

pub fn caller_from_headers(headers: &axum::http::HeaderMap) -> Option<EmployeeId> {
    headers
        .get(CALLER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(EmployeeId::new)
}
