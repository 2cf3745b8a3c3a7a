use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{AttendanceId, AttendanceRecord, AttendanceStatus, LocationReading};
use super::evaluator::{AttendanceEvaluator, CheckInAttempt, CheckInRejection, GeofenceOutcome};
use super::geo::{self, ZoneProximity};
use super::repository::AttendanceRepository;
use crate::config::WorkflowConfig;
use crate::workflows::directory::{
    authenticate, AttendanceCondition, AuthError, Coordinate, DirectoryRepository, Employee,
    EmployeeId, Shift,
};
use crate::workflows::repository::RepositoryError;

/// Service composing the directory, attendance store, and evaluator.
pub struct AttendanceService<D, A> {
    directory: Arc<D>,
    records: Arc<A>,
    evaluator: Arc<AttendanceEvaluator>,
}

static ATTENDANCE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_attendance_id() -> AttendanceId {
    let id = ATTENDANCE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AttendanceId(format!("att-{id:06}"))
}

/// Result of an admitted check-in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckInReceipt {
    pub record_id: AttendanceId,
    pub status: AttendanceStatus,
    pub geofence: GeofenceOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutReceipt {
    pub record_id: AttendanceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worked_minutes: Option<i64>,
}

/// Location feedback for callers polling the device before check-in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeofencePreview {
    pub bypassed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest: Option<ZoneProximity>,
}

impl<D, A> AttendanceService<D, A>
where
    D: DirectoryRepository + 'static,
    A: AttendanceRepository + 'static,
{
    pub fn new(directory: Arc<D>, records: Arc<A>, config: &WorkflowConfig) -> Self {
        let evaluator = AttendanceEvaluator::new(config.geofence_policy());
        Self::with_evaluator(directory, records, evaluator)
    }

    pub fn with_evaluator(
        directory: Arc<D>,
        records: Arc<A>,
        evaluator: AttendanceEvaluator,
    ) -> Self {
        Self {
            directory,
            records,
            evaluator: Arc::new(evaluator),
        }
    }

    /// Admit a check-in and persist today's record.
    pub fn check_in(
        &self,
        caller: Option<&EmployeeId>,
        location: Option<LocationReading>,
        now: NaiveDateTime,
    ) -> Result<CheckInReceipt, AttendanceServiceError> {
        let employee = authenticate(self.directory.as_ref(), caller)?;
        let shift = self.assigned_shift(&employee)?;
        let zones = self.directory.zones()?;
        let date = now.date();
        let existing = self.records.for_day(&employee.id, date)?;

        let decision = self
            .evaluator
            .evaluate(CheckInAttempt {
                employee: &employee,
                shift: shift.as_ref(),
                now,
                location,
                zones: &zones,
                existing: existing.as_ref(),
            })
            .map_err(|rejection| {
                warn!(employee = %employee.id, %rejection, "check-in rejected");
                rejection
            })?;

        let record = AttendanceRecord {
            id: next_attendance_id(),
            employee_id: employee.id.clone(),
            date,
            check_in: Some(now),
            check_out: None,
            status: decision.status,
            location: decision.location,
            manual: decision.manual,
            revision: 0,
        };

        let stored = self.records.insert(record)?;
        info!(
            employee = %employee.id,
            record = %stored.id.0,
            status = stored.status.label(),
            "check-in recorded"
        );

        Ok(CheckInReceipt {
            record_id: stored.id,
            status: stored.status,
            geofence: decision.geofence,
        })
    }

    /// Close the caller's open record. Location is not re-validated.
    pub fn check_out(
        &self,
        caller: Option<&EmployeeId>,
        now: NaiveDateTime,
    ) -> Result<CheckOutReceipt, AttendanceServiceError> {
        let employee = authenticate(self.directory.as_ref(), caller)?;
        let overnight = self
            .assigned_shift(&employee)?
            .is_some_and(|shift| shift.is_overnight());
        let mut record = self
            .open_record(&employee.id, now.date(), overnight)?
            .ok_or(AttendanceServiceError::NoActiveCheckIn)?;

        record.check_out = Some(now);
        let stored = self.records.update(record)?;
        info!(employee = %employee.id, record = %stored.id.0, "check-out recorded");

        Ok(CheckOutReceipt {
            worked_minutes: stored.worked_minutes(),
            record_id: stored.id,
        })
    }

    /// Nearest zone for a polled coordinate, without recording anything.
    pub fn preview(
        &self,
        caller: Option<&EmployeeId>,
        coordinate: Coordinate,
    ) -> Result<GeofencePreview, AttendanceServiceError> {
        let employee = authenticate(self.directory.as_ref(), caller)?;
        if self.evaluator.bypasses_geofence(&employee) {
            return Ok(GeofencePreview {
                bypassed: true,
                nearest: None,
            });
        }

        let zones = self.directory.zones()?;
        Ok(GeofencePreview {
            bypassed: false,
            nearest: geo::nearest_zone(&coordinate, &zones),
        })
    }

    pub fn today(
        &self,
        caller: Option<&EmployeeId>,
        now: NaiveDateTime,
    ) -> Result<Option<AttendanceRecord>, AttendanceServiceError> {
        let employee = authenticate(self.directory.as_ref(), caller)?;
        Ok(self.records.for_day(&employee.id, now.date())?)
    }

    fn assigned_shift(&self, employee: &Employee) -> Result<Option<Shift>, RepositoryError> {
        if employee.attendance_condition != AttendanceCondition::Shift {
            return Ok(None);
        }

        let Some(shift_id) = employee.shift_id.as_ref() else {
            return Ok(None);
        };

        let shift = self.directory.shift(shift_id)?;
        if shift.is_none() {
            warn!(employee = %employee.id, shift = %shift_id.0, "assigned shift missing; lateness skipped");
        }
        Ok(shift)
    }

    /// Today's open record. Employees on an overnight shift may also close
    /// yesterday's record after midnight.
    fn open_record(
        &self,
        employee_id: &EmployeeId,
        date: NaiveDate,
        overnight: bool,
    ) -> Result<Option<AttendanceRecord>, RepositoryError> {
        if let Some(record) = self.records.for_day(employee_id, date)? {
            return Ok(record.is_open().then_some(record));
        }
        if !overnight {
            return Ok(None);
        }

        let Some(previous) = date.pred_opt() else {
            return Ok(None);
        };
        Ok(self
            .records
            .for_day(employee_id, previous)?
            .filter(AttendanceRecord::is_open))
    }
}

/// Error raised by the attendance service.
#[derive(Debug, thiserror::Error)]
pub enum AttendanceServiceError {
    #[error("not authenticated")]
    Unauthenticated,
    #[error("employee {0} not found")]
    EmployeeNotFound(EmployeeId),
    #[error(transparent)]
    Rejected(#[from] CheckInRejection),
    #[error("no active check-in to close")]
    NoActiveCheckIn,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<AuthError> for AttendanceServiceError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::Unauthenticated => Self::Unauthenticated,
            AuthError::UnknownEmployee(id) => Self::EmployeeNotFound(id),
            AuthError::Repository(err) => Self::Repository(err),
        }
    }
}
