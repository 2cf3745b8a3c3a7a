use super::domain::{Employee, EmployeeId, LocationZone, Shift, ShiftId};
use crate::workflows::repository::RepositoryError;

/// Read access to the organizational configuration collections.
pub trait DirectoryRepository: Send + Sync {
    fn employee(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError>;
    fn shift(&self, id: &ShiftId) -> Result<Option<Shift>, RepositoryError>;
    fn zones(&self) -> Result<Vec<LocationZone>, RepositoryError>;
}
