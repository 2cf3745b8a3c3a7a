use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::workflows::attendance::{
    AttendanceEvaluator, AttendanceRecord, AttendanceRepository, AttendanceService,
    GeofencePolicy,
};
use crate::workflows::directory::{
    AttendanceCondition, Coordinate, DirectoryRepository, Employee, EmployeeId, LocationZone,
    PermissionTable, Role, Shift, ShiftId, ZoneId,
};
use crate::workflows::repository::RepositoryError;

pub(super) const HQ: Coordinate = Coordinate::new(13.7563, 100.5018);
pub(super) const FACTORY: Coordinate = Coordinate::new(13.3611, 100.9847);

pub(super) fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 11, day)
        .expect("valid date")
        .and_hms_opt(hour, minute, 0)
        .expect("valid time")
}

pub(super) fn shift(id: &str, start: &str, end: &str, grace_minutes: u32) -> Shift {
    Shift {
        id: ShiftId(id.to_string()),
        name: format!("shift {id}"),
        start: Shift::parse_time(start).expect("valid start"),
        end: Shift::parse_time(end).expect("valid end"),
        grace_minutes,
    }
}

pub(super) fn office_shift() -> Shift {
    shift("s1", "08:00", "17:00", 15)
}

pub(super) fn zones() -> Vec<LocationZone> {
    vec![
        LocationZone::new(ZoneId("l1".to_string()), "Head office", HQ, 100.0).expect("zone"),
        LocationZone::new(ZoneId("l2".to_string()), "Factory", FACTORY, 250.0).expect("zone"),
    ]
}

pub(super) fn staff() -> Vec<Employee> {
    vec![
        Employee::new("u1", "Somchai", Role::Ceo, AttendanceCondition::Exempt),
        Employee::new("u2", "Somying", Role::Admin, AttendanceCondition::Flexible),
        Employee::new("u6", "Wipada", Role::OfficeManager, AttendanceCondition::Flexible),
        Employee::new("u3", "Somsak", Role::Supervisor, AttendanceCondition::Shift)
            .with_shift(ShiftId("s2".to_string())),
        Employee::new("u5", "Mind", Role::Employee, AttendanceCondition::Shift)
            .with_shift(ShiftId("s1".to_string()))
            .with_approvers([Some(EmployeeId::new("u3")), None, None]),
        Employee::new("u7", "Field", Role::Employee, AttendanceCondition::Shift)
            .with_shift(ShiftId("s1".to_string()))
            .with_geofence_exemption(Some("site visits".to_string())),
        Employee::new("u8", "Night", Role::Employee, AttendanceCondition::Shift)
            .with_shift(ShiftId("s3".to_string())),
        Employee::new("u9", "Orphan", Role::Employee, AttendanceCondition::Shift)
            .with_shift(ShiftId("retired".to_string())),
    ]
}

pub(super) fn employee(id: &str) -> Employee {
    staff()
        .into_iter()
        .find(|employee| employee.id.as_str() == id)
        .expect("fixture employee")
}

pub(super) fn id(raw: &str) -> EmployeeId {
    EmployeeId::new(raw)
}

#[derive(Clone)]
pub(super) struct MemoryDirectory {
    employees: HashMap<EmployeeId, Employee>,
    shifts: HashMap<ShiftId, Shift>,
    zones: Vec<LocationZone>,
}

impl MemoryDirectory {
    pub(super) fn seeded() -> Self {
        let shifts = [
            office_shift(),
            shift("s2", "07:00", "16:00", 10),
            shift("s3", "15:00", "00:00", 10),
        ];
        Self {
            employees: staff()
                .into_iter()
                .map(|employee| (employee.id.clone(), employee))
                .collect(),
            shifts: shifts
                .into_iter()
                .map(|shift| (shift.id.clone(), shift))
                .collect(),
            zones: zones(),
        }
    }

    pub(super) fn without_zones(mut self) -> Self {
        self.zones.clear();
        self
    }
}

impl DirectoryRepository for MemoryDirectory {
    fn employee(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        Ok(self.employees.get(id).cloned())
    }

    fn shift(&self, id: &ShiftId) -> Result<Option<Shift>, RepositoryError> {
        Ok(self.shifts.get(id).cloned())
    }

    fn zones(&self) -> Result<Vec<LocationZone>, RepositoryError> {
        Ok(self.zones.clone())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAttendance {
    records: Arc<Mutex<HashMap<(EmployeeId, NaiveDate), AttendanceRecord>>>,
}

impl MemoryAttendance {
    pub(super) fn stored(&self, employee_id: &str, date: NaiveDate) -> Option<AttendanceRecord> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(&(EmployeeId::new(employee_id), date))
            .cloned()
    }
}

impl AttendanceRepository for MemoryAttendance {
    fn insert(&self, record: AttendanceRecord) -> Result<AttendanceRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let key = (record.employee_id.clone(), record.date);
        if guard.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(key, record.clone());
        Ok(record)
    }

    fn update(&self, mut record: AttendanceRecord) -> Result<AttendanceRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let key = (record.employee_id.clone(), record.date);
        let stored = guard.get(&key).ok_or(RepositoryError::NotFound)?;
        if stored.revision != record.revision {
            return Err(RepositoryError::Conflict);
        }
        record.revision += 1;
        guard.insert(key, record.clone());
        Ok(record)
    }

    fn for_day(
        &self,
        employee_id: &EmployeeId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&(employee_id.clone(), date)).cloned())
    }
}

pub(super) struct UnavailableAttendance;

impl AttendanceRepository for UnavailableAttendance {
    fn insert(&self, _record: AttendanceRecord) -> Result<AttendanceRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: AttendanceRecord) -> Result<AttendanceRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_day(
        &self,
        _employee_id: &EmployeeId,
        _date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn evaluator() -> AttendanceEvaluator {
    AttendanceEvaluator::new(GeofencePolicy {
        permissions: PermissionTable::standard(),
        flexible_skips_geofence: false,
    })
}

pub(super) fn build_service() -> (
    AttendanceService<MemoryDirectory, MemoryAttendance>,
    Arc<MemoryAttendance>,
) {
    let records = Arc::new(MemoryAttendance::default());
    let service = AttendanceService::with_evaluator(
        Arc::new(MemoryDirectory::seeded()),
        records.clone(),
        evaluator(),
    );
    (service, records)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
