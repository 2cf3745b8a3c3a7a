use chrono::NaiveDate;

use super::domain::AttendanceRecord;
use crate::workflows::directory::EmployeeId;
use crate::workflows::repository::RepositoryError;

/// Storage abstraction for attendance records.
///
/// `insert` must refuse a second record for the same employee and date with
/// [`RepositoryError::Conflict`]. `update` compares the incoming `revision`
/// with the stored one, refuses stale writes with `Conflict`, and returns the
/// stored record with its revision incremented.
pub trait AttendanceRepository: Send + Sync {
    fn insert(&self, record: AttendanceRecord) -> Result<AttendanceRecord, RepositoryError>;
    fn update(&self, record: AttendanceRecord) -> Result<AttendanceRecord, RepositoryError>;
    fn for_day(
        &self,
        employee_id: &EmployeeId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, RepositoryError>;
}
