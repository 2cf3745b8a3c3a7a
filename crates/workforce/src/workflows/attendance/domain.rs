use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::workflows::directory::{Coordinate, EmployeeId};

/// Identifier wrapper for attendance records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttendanceId(pub String);

/// Status fixed at check-in time and never recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Normal,
    Late,
}

impl AttendanceStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AttendanceStatus::Normal => "NORMAL",
            AttendanceStatus::Late => "LATE",
        }
    }
}

/// What the device reported when the check-in was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LocationReading {
    Fix(Coordinate),
    /// The device geolocation source refused or failed.
    Unavailable,
}

impl LocationReading {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            LocationReading::Fix(coordinate) => Some(*coordinate),
            LocationReading::Unavailable => None,
        }
    }
}

/// One employee's attendance for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: AttendanceId,
    pub employee_id: EmployeeId,
    pub date: NaiveDate,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub status: AttendanceStatus,
    pub location: Option<Coordinate>,
    /// Set for FLEXIBLE employees whose entry is not tied to a shift.
    pub manual: bool,
    #[serde(default)]
    pub revision: u64,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.check_in.is_some() && self.check_out.is_none()
    }

    /// Minutes between check-in and check-out once both are present.
    ///
    /// Check-outs are full timestamps, so a shift that crosses midnight
    /// yields the elapsed time rather than a negative span.
    pub fn worked_minutes(&self) -> Option<i64> {
        match (self.check_in, self.check_out) {
            (Some(check_in), Some(check_out)) => {
                Some((check_out - check_in).num_minutes().max(0))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(check_in: (u32, u32, u32), check_out: Option<(u32, u32, u32)>) -> AttendanceRecord {
        let day = |d: u32, h: u32, m: u32| {
            NaiveDate::from_ymd_opt(2025, 11, d)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap()
        };
        AttendanceRecord {
            id: AttendanceId("att-1".into()),
            employee_id: EmployeeId::new("u5"),
            date: NaiveDate::from_ymd_opt(2025, 11, check_in.0).unwrap(),
            check_in: Some(day(check_in.0, check_in.1, check_in.2)),
            check_out: check_out.map(|(d, h, m)| day(d, h, m)),
            status: AttendanceStatus::Normal,
            location: None,
            manual: false,
            revision: 0,
        }
    }

    #[test]
    fn worked_minutes_requires_check_out() {
        let open = record((20, 8, 0), None);
        assert!(open.is_open());
        assert_eq!(open.worked_minutes(), None);
    }

    #[test]
    fn worked_minutes_spans_midnight() {
        let day_shift = record((20, 8, 5), Some((20, 17, 20)));
        assert_eq!(day_shift.worked_minutes(), Some(9 * 60 + 15));

        let overnight = record((20, 15, 0), Some((21, 0, 30)));
        assert_eq!(overnight.worked_minutes(), Some(9 * 60 + 30));
        assert!(!overnight.is_open());
    }
}
