use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::clock;
use super::domain::{AttendanceRecord, AttendanceStatus, LocationReading};
use super::geo::{self, ZoneProximity};
use crate::workflows::directory::{
    AttendanceCondition, Capability, Coordinate, Employee, LocationZone, PermissionTable, Shift,
    ZoneId,
};

/// Reasons a check-in attempt is refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckInRejection {
    #[error("employee is exempt from attendance check-in")]
    NotRequired,
    #[error("already checked in on {date}")]
    AlreadyCheckedIn { date: NaiveDate },
    #[error("outside permitted area{}", nearest_suffix(.nearest))]
    OutsidePermittedArea { nearest: Option<ZoneProximity> },
    #[error("location required to check in")]
    LocationRequired,
    #[error("location unavailable")]
    LocationUnavailable,
}

fn nearest_suffix(nearest: &Option<ZoneProximity>) -> String {
    match nearest {
        Some(zone) => format!(
            " (nearest {} at {:.0} m)",
            zone.zone_name, zone.distance_meters
        ),
        None => String::new(),
    }
}

/// How the geofence rule was satisfied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum GeofenceOutcome {
    /// Role capability, per-employee flag, or flexible policy skipped enforcement.
    Bypassed,
    /// No zones are configured, so every location is admissible.
    Unrestricted,
    Inside {
        zone_id: ZoneId,
        distance_meters: f64,
    },
}

/// Inputs gathered by the caller for one check-in attempt.
#[derive(Debug, Clone, Copy)]
pub struct CheckInAttempt<'a> {
    pub employee: &'a Employee,
    pub shift: Option<&'a Shift>,
    pub now: NaiveDateTime,
    pub location: Option<LocationReading>,
    pub zones: &'a [LocationZone],
    pub existing: Option<&'a AttendanceRecord>,
}

/// Admitted check-in, ready to be persisted as today's record.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInDecision {
    pub status: AttendanceStatus,
    pub manual: bool,
    pub location: Option<Coordinate>,
    pub geofence: GeofenceOutcome,
}

/// Rules controlling geofence enforcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeofencePolicy {
    pub permissions: PermissionTable,
    /// When set, FLEXIBLE employees skip the geofence like exempt roles.
    pub flexible_skips_geofence: bool,
}

impl Default for GeofencePolicy {
    fn default() -> Self {
        Self {
            permissions: PermissionTable::standard(),
            flexible_skips_geofence: false,
        }
    }
}

/// Stateless evaluator deciding admission and status of a check-in.
#[derive(Debug, Clone, Default)]
pub struct AttendanceEvaluator {
    policy: GeofencePolicy,
}

impl AttendanceEvaluator {
    pub fn new(policy: GeofencePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &GeofencePolicy {
        &self.policy
    }

    pub fn bypasses_geofence(&self, employee: &Employee) -> bool {
        employee.skip_geofence
            || self
                .policy
                .permissions
                .allows(employee.role, Capability::BypassGeofence)
            || (self.policy.flexible_skips_geofence
                && employee.attendance_condition == AttendanceCondition::Flexible)
    }

    pub fn evaluate(&self, attempt: CheckInAttempt<'_>) -> Result<CheckInDecision, CheckInRejection> {
        let employee = attempt.employee;
        if employee.attendance_condition == AttendanceCondition::Exempt {
            return Err(CheckInRejection::NotRequired);
        }

        if let Some(existing) = attempt.existing {
            if existing.check_in.is_some() {
                return Err(CheckInRejection::AlreadyCheckedIn {
                    date: existing.date,
                });
            }
        }

        let location = attempt.location.and_then(|reading| reading.coordinate());
        let geofence = self.geofence(employee, attempt.location, attempt.zones)?;
        let (status, manual) = self.lateness(employee, attempt.shift, attempt.now);

        Ok(CheckInDecision {
            status,
            manual,
            location,
            geofence,
        })
    }

    fn geofence(
        &self,
        employee: &Employee,
        reading: Option<LocationReading>,
        zones: &[LocationZone],
    ) -> Result<GeofenceOutcome, CheckInRejection> {
        if self.bypasses_geofence(employee) {
            return Ok(GeofenceOutcome::Bypassed);
        }

        if zones.is_empty() {
            return Ok(GeofenceOutcome::Unrestricted);
        }

        let coordinate = match reading {
            Some(LocationReading::Fix(coordinate)) => coordinate,
            Some(LocationReading::Unavailable) => {
                return Err(CheckInRejection::LocationUnavailable)
            }
            None => return Err(CheckInRejection::LocationRequired),
        };

        match geo::admitting_zone(&coordinate, zones) {
            Some(zone) => Ok(GeofenceOutcome::Inside {
                zone_id: zone.zone_id,
                distance_meters: zone.distance_meters,
            }),
            None => Err(CheckInRejection::OutsidePermittedArea {
                nearest: geo::nearest_zone(&coordinate, zones),
            }),
        }
    }

    fn lateness(
        &self,
        employee: &Employee,
        shift: Option<&Shift>,
        now: NaiveDateTime,
    ) -> (AttendanceStatus, bool) {
        match (employee.attendance_condition, shift) {
            (AttendanceCondition::Shift, Some(shift)) => {
                if clock::is_late(now, shift.start, shift.grace_minutes) {
                    (AttendanceStatus::Late, false)
                } else {
                    (AttendanceStatus::Normal, false)
                }
            }
            (AttendanceCondition::Flexible, _) => (AttendanceStatus::Normal, true),
            _ => (AttendanceStatus::Normal, false),
        }
    }
}
