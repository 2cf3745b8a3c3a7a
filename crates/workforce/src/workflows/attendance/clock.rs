use chrono::{Duration, NaiveDateTime, NaiveTime};

/// Latest on-time check-in for the calendar day of `now`.
///
/// Only the shift start is consulted, so overnight shifts whose end time is
/// earlier than their start are evaluated the same way as day shifts.
pub fn admission_deadline(
    now: NaiveDateTime,
    shift_start: NaiveTime,
    grace_minutes: u32,
) -> NaiveDateTime {
    now.date().and_time(shift_start) + Duration::minutes(i64::from(grace_minutes))
}

/// `true` iff `now` is strictly after the shift start plus grace.
pub fn is_late(now: NaiveDateTime, shift_start: NaiveTime, grace_minutes: u32) -> bool {
    now > admission_deadline(now, shift_start, grace_minutes)
}
