//! Attendance check-in capture: geofence admission, lateness against the
//! assigned shift, and the single check-out mutation.

pub mod clock;
pub mod domain;
pub mod evaluator;
pub mod geo;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use clock::{admission_deadline, is_late};
pub use domain::{AttendanceId, AttendanceRecord, AttendanceStatus, LocationReading};
pub use evaluator::{
    AttendanceEvaluator, CheckInAttempt, CheckInDecision, CheckInRejection, GeofenceOutcome,
    GeofencePolicy,
};
pub use geo::{admitting_zone, distance_meters, nearest_zone, ZoneProximity, EARTH_RADIUS_METERS};
pub use repository::AttendanceRepository;
pub use router::attendance_router;
pub use service::{
    AttendanceService, AttendanceServiceError, CheckInReceipt, CheckOutReceipt, GeofencePreview,
};
