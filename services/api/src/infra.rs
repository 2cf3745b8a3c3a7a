use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use workforce::workflows::attendance::{AttendanceRecord, AttendanceRepository};
use workforce::workflows::directory::{
    AttendanceCondition, Coordinate, DirectoryError, DirectoryRepository, Employee, EmployeeId,
    LocationZone, Role, Shift, ShiftId, ZoneId,
};
use workforce::workflows::leave::{LeaveRepository, LeaveRequest, LeaveRequestId, LeaveStatus};
use workforce::workflows::RepositoryError;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Read-only organizational data held in memory.
#[derive(Default, Clone)]
pub(crate) struct InMemoryDirectory {
    employees: HashMap<EmployeeId, Employee>,
    shifts: HashMap<ShiftId, Shift>,
    zones: Vec<LocationZone>,
}

impl InMemoryDirectory {
    pub(crate) fn with_employee(mut self, employee: Employee) -> Result<Self, DirectoryError> {
        employee.validate()?;
        self.employees.insert(employee.id.clone(), employee);
        Ok(self)
    }

    pub(crate) fn with_shift(
        mut self,
        id: &str,
        name: &str,
        start: &str,
        end: &str,
        grace_minutes: u32,
    ) -> Result<Self, DirectoryError> {
        let shift = Shift {
            id: ShiftId(id.to_string()),
            name: name.to_string(),
            start: Shift::parse_time(start)?,
            end: Shift::parse_time(end)?,
            grace_minutes,
        };
        self.shifts.insert(shift.id.clone(), shift);
        Ok(self)
    }

    pub(crate) fn with_zone(
        mut self,
        id: &str,
        name: &str,
        center: Coordinate,
        radius_meters: f64,
    ) -> Result<Self, DirectoryError> {
        self.zones.push(LocationZone::new(
            ZoneId(id.to_string()),
            name,
            center,
            radius_meters,
        )?);
        Ok(self)
    }

    /// Demo organization: one head office, one factory, three shifts.
    pub(crate) fn seeded() -> Result<Self, DirectoryError> {
        Self::default()
            .with_shift("s1", "Office day", "08:00", "17:00", 15)?
            .with_shift("s2", "Factory shift A", "07:00", "16:00", 10)?
            .with_shift("s3", "Factory shift B", "15:00", "00:00", 10)?
            .with_zone("l1", "Head office", Coordinate::new(13.7563, 100.5018), 100.0)?
            .with_zone("l2", "Factory", Coordinate::new(13.3611, 100.9847), 250.0)?
            .with_employee(Employee::new(
                "u1",
                "Somchai",
                Role::Ceo,
                AttendanceCondition::Exempt,
            ))?
            .with_employee(Employee::new(
                "u2",
                "Somying",
                Role::Admin,
                AttendanceCondition::Flexible,
            ))?
            .with_employee(Employee::new(
                "u6",
                "Wipada",
                Role::OfficeManager,
                AttendanceCondition::Flexible,
            ))?
            .with_employee(
                Employee::new("u3", "Somsak", Role::Supervisor, AttendanceCondition::Shift)
                    .with_shift(ShiftId("s2".to_string())),
            )?
            .with_employee(
                Employee::new("u5", "Mind", Role::Employee, AttendanceCondition::Shift)
                    .with_shift(ShiftId("s1".to_string()))
                    .with_approvers([Some(EmployeeId::new("u3")), None, None]),
            )?
            .with_employee(
                Employee::new("u7", "Ploy", Role::Employee, AttendanceCondition::Shift)
                    .with_shift(ShiftId("s1".to_string())),
            )?
            .with_employee(
                Employee::new("u8", "Krit", Role::Employee, AttendanceCondition::Shift)
                    .with_shift(ShiftId("s1".to_string()))
                    .with_geofence_exemption(Some("field sales".to_string())),
            )
    }
}

impl DirectoryRepository for InMemoryDirectory {
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
pub(crate) struct InMemoryAttendanceRepository {
    records: Arc<Mutex<HashMap<(EmployeeId, NaiveDate), AttendanceRecord>>>,
}

impl AttendanceRepository for InMemoryAttendanceRepository {
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
        match guard.get(&key) {
            Some(stored) if stored.revision == record.revision => {
                record.revision += 1;
                guard.insert(key, record.clone());
                Ok(record)
            }
            Some(_) => Err(RepositoryError::Conflict),
            None => Err(RepositoryError::NotFound),
        }
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

/// Leave store with compare-and-swap on `revision`.
#[derive(Default, Clone)]
pub(crate) struct InMemoryLeaveRepository {
    requests: Arc<Mutex<Vec<LeaveRequest>>>,
}

impl LeaveRepository for InMemoryLeaveRepository {
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

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
