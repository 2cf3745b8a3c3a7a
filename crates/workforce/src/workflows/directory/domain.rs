use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for employees held in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

impl EmployeeId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed set of organizational roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Employee,
    Supervisor,
    OfficeManager,
    FactoryManager,
    Admin,
    Ceo,
}

impl Role {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Employee,
            Self::Supervisor,
            Self::OfficeManager,
            Self::FactoryManager,
            Self::Admin,
            Self::Ceo,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Employee => "EMPLOYEE",
            Self::Supervisor => "SUPERVISOR",
            Self::OfficeManager => "OFFICE_MANAGER",
            Self::FactoryManager => "FACTORY_MANAGER",
            Self::Admin => "ADMIN",
            Self::Ceo => "CEO",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = DirectoryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ordered()
            .into_iter()
            .find(|role| role.label() == normalized)
            .ok_or_else(|| DirectoryError::UnknownRole(raw.trim().to_string()))
    }
}

/// How an employee is expected to record attendance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceCondition {
    /// Checks in against an assigned shift; lateness applies.
    #[serde(rename = "SHIFT")]
    Shift,
    /// Checks in whenever; always on time and flagged as manual.
    #[serde(rename = "FLEXIBLE")]
    Flexible,
    /// Exempt from check-in entirely.
    #[serde(rename = "NONE")]
    Exempt,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShiftId(pub String);

/// Work shift definition. Grace minutes are unsigned, so a negative grace
/// period cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub name: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub grace_minutes: u32,
}

impl Shift {
    /// Parse a `HH:MM` (or `HH:MM:SS`) time-of-day string.
    pub fn parse_time(raw: &str) -> Result<NaiveTime, DirectoryError> {
        let trimmed = raw.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .map_err(|_| DirectoryError::InvalidShiftTime(trimmed.to_string()))
    }

    pub fn is_overnight(&self) -> bool {
        self.end < self.start
    }
}

/// WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(pub String);

/// Circular area in which check-in is admitted. Deserialization goes
/// through [`LocationZone::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ZoneRecord")]
pub struct LocationZone {
    pub id: ZoneId,
    pub name: String,
    pub center: Coordinate,
    pub radius_meters: f64,
}

impl LocationZone {
    pub fn new(
        id: ZoneId,
        name: impl Into<String>,
        center: Coordinate,
        radius_meters: f64,
    ) -> Result<Self, DirectoryError> {
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(DirectoryError::InvalidZoneRadius {
                zone: id,
                radius_meters,
            });
        }

        Ok(Self {
            id,
            name: name.into(),
            center,
            radius_meters,
        })
    }
}

#[derive(Deserialize)]
struct ZoneRecord {
    id: ZoneId,
    name: String,
    center: Coordinate,
    radius_meters: f64,
}

impl TryFrom<ZoneRecord> for LocationZone {
    type Error = DirectoryError;

    fn try_from(record: ZoneRecord) -> Result<Self, Self::Error> {
        LocationZone::new(record.id, record.name, record.center, record.radius_meters)
    }
}

/// Directory entry for a person. Approver slots are kept positional so admin
/// edits can leave a gap; the approval chain resolver compacts them.
/// Deserialized entries are checked with [`Employee::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EmployeeRecord")]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub role: Role,
    pub shift_id: Option<ShiftId>,
    pub attendance_condition: AttendanceCondition,
    pub approvers: [Option<EmployeeId>; 3],
    pub skip_geofence: bool,
    pub skip_geofence_reason: Option<String>,
}

#[derive(Deserialize)]
struct EmployeeRecord {
    id: EmployeeId,
    name: String,
    role: Role,
    #[serde(default)]
    shift_id: Option<ShiftId>,
    attendance_condition: AttendanceCondition,
    #[serde(default)]
    approvers: [Option<EmployeeId>; 3],
    #[serde(default)]
    skip_geofence: bool,
    #[serde(default)]
    skip_geofence_reason: Option<String>,
}

impl TryFrom<EmployeeRecord> for Employee {
    type Error = DirectoryError;

    fn try_from(record: EmployeeRecord) -> Result<Self, Self::Error> {
        let employee = Employee {
            id: record.id,
            name: record.name,
            role: record.role,
            shift_id: record.shift_id,
            attendance_condition: record.attendance_condition,
            approvers: record.approvers,
            skip_geofence: record.skip_geofence,
            skip_geofence_reason: record.skip_geofence_reason,
        };
        employee.validate()?;
        Ok(employee)
    }
}

impl Employee {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: Role,
        attendance_condition: AttendanceCondition,
    ) -> Self {
        Self {
            id: EmployeeId::new(id),
            name: name.into(),
            role,
            shift_id: None,
            attendance_condition,
            approvers: [None, None, None],
            skip_geofence: false,
            skip_geofence_reason: None,
        }
    }

    pub fn with_shift(mut self, shift_id: ShiftId) -> Self {
        self.shift_id = Some(shift_id);
        self
    }

    /// Assign approver slots 1 through 3 in order.
    pub fn with_approvers(mut self, approvers: [Option<EmployeeId>; 3]) -> Self {
        self.approvers = approvers;
        self
    }

    pub fn with_geofence_exemption(mut self, reason: Option<String>) -> Self {
        self.skip_geofence = true;
        self.skip_geofence_reason = reason;
        self
    }

    /// Check the invariants an admin edit must satisfy before it is stored.
    pub fn validate(&self) -> Result<(), DirectoryError> {
        if let Some(slot) = self
            .approvers
            .iter()
            .position(|approver| approver.as_ref() == Some(&self.id))
        {
            return Err(DirectoryError::SelfApproval {
                employee: self.id.clone(),
                slot: slot + 1,
            });
        }

        Ok(())
    }
}

/// Validation failures for directory entities.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("employee {employee} lists themselves as approver {slot}")]
    SelfApproval { employee: EmployeeId, slot: usize },
    #[error("zone {zone:?} radius must be positive (found {radius_meters})")]
    InvalidZoneRadius { zone: ZoneId, radius_meters: f64 },
    #[error("shift time '{0}' must be formatted HH:MM")]
    InvalidShiftTime(String),
    #[error("unknown role '{0}'")]
    UnknownRole(String),
}
