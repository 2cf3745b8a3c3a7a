//! Organizational configuration the workflows read: employees, shifts,
//! location zones, and the role permission table.

pub mod caller;
pub mod domain;
pub mod permissions;
pub mod repository;

pub use caller::{authenticate, caller_from_headers, AuthError, Caller, CALLER_HEADER};
pub use domain::{
    AttendanceCondition, Coordinate, DirectoryError, Employee, EmployeeId, LocationZone, Role,
    Shift, ShiftId, ZoneId,
};
pub use permissions::{Capability, PermissionTable};
pub use repository::DirectoryRepository;
