use crate::infra::{InMemoryAttendanceRepository, InMemoryDirectory, InMemoryLeaveRepository};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use clap::Args;
use std::sync::Arc;
use workforce::config::WorkflowConfig;
use workforce::error::AppError;
use workforce::workflows::attendance::{AttendanceService, LocationReading};
use workforce::workflows::directory::{Coordinate, EmployeeId};
use workforce::workflows::leave::{LeaveDraft, LeaveRequest, LeaveService, LeaveType};

type DemoAttendance = AttendanceService<InMemoryDirectory, InMemoryAttendanceRepository>;
type DemoLeave = LeaveService<InMemoryDirectory, InMemoryLeaveRepository>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Working day used for the scenarios (YYYY-MM-DD). Defaults to 2025-11-20.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Skip the attendance portion of the demo.
    #[arg(long)]
    pub(crate) skip_attendance: bool,
    /// Skip the leave approval portion of the demo.
    #[arg(long)]
    pub(crate) skip_leave: bool,
}

fn default_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 20).unwrap_or_default()
}

fn at(day: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    day.and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        date,
        skip_attendance,
        skip_leave,
    } = args;
    let day = date.unwrap_or_else(default_day);
    let config = WorkflowConfig::default();
    let directory = Arc::new(InMemoryDirectory::seeded()?);

    println!("Workforce workflow demo for {day}");

    if !skip_attendance {
        let attendance = AttendanceService::new(
            directory.clone(),
            Arc::new(InMemoryAttendanceRepository::default()),
            &config,
        );
        run_attendance(&attendance, day)?;
    }

    if !skip_leave {
        let leave = LeaveService::new(
            directory,
            Arc::new(InMemoryLeaveRepository::default()),
            &config,
        );
        run_leave(&leave, day)?;
    }

    Ok(())
}

fn run_attendance(service: &DemoAttendance, day: NaiveDate) -> Result<(), AppError> {
    println!("\nAttendance");
    let head_office = LocationReading::Fix(Coordinate::new(13.7563, 100.5018));
    let mind = EmployeeId::new("u5");

    let receipt = service.check_in(Some(&mind), Some(head_office), at(day, 8, 16))?;
    println!(
        "- Mind checks in at 08:16 at head office: {} ({:?})",
        receipt.status.label(),
        receipt.geofence
    );

    let outside = LocationReading::Fix(Coordinate::new(13.4000, 100.9847));
    match service.check_in(Some(&EmployeeId::new("u3")), Some(outside), at(day, 6, 55)) {
        Ok(receipt) => println!("- Somsak checks in: {}", receipt.status.label()),
        Err(err) => println!("- Somsak checks in 4 km from the factory: refused, {err}"),
    }

    let receipt = service.check_in(Some(&EmployeeId::new("u8")), None, at(day, 9, 0))?;
    println!(
        "- Krit (geofence exempt) checks in at 09:00 without location: {}",
        receipt.status.label()
    );

    let checkout = service.check_out(Some(&mind), at(day, 17, 30))?;
    if let Some(minutes) = checkout.worked_minutes {
        println!(
            "- Mind checks out at 17:30 after {}h{:02}m",
            minutes / 60,
            minutes % 60
        );
    }

    Ok(())
}

fn run_leave(service: &DemoLeave, day: NaiveDate) -> Result<(), AppError> {
    println!("\nLeave approval");
    let ploy = EmployeeId::new("u7");
    let chain = service.resolve_chain(&ploy)?;
    let steps: Vec<String> = chain.iter().map(ToString::to_string).collect();
    println!("- Ploy's approval chain: {}", steps.join(" -> "));

    let submitted = service.submit(
        Some(&ploy),
        LeaveDraft {
            leave_type: LeaveType::Vacation,
            start_date: day,
            end_date: day + Duration::days(1),
            reason: "family trip".to_string(),
            attachment: None,
            substitute: Some(EmployeeId::new("u5")),
        },
        at(day - Duration::days(2), 9, 0),
    )?;
    println!(
        "- Submitted {} for {} days, waiting on {}",
        submitted.id,
        submitted.span_days(),
        submitted.current_approver
    );

    let mut latest = submitted.clone();
    for approver in ["u3", "u6", "u1"] {
        let transition = service.approve(
            Some(&EmployeeId::new(approver)),
            &submitted.id,
            at(day - Duration::days(1), 10, 0),
        )?;
        latest = transition.request;
        println!(
            "- {approver} approves: status {}, next {}",
            latest.status.label(),
            latest.current_approver
        );
    }
    print_history(&latest);

    let quota = service.quota(&ploy, LeaveType::Vacation, day.year())?;
    println!(
        "- Vacation quota: used {}, pending {}, available {} of {}",
        quota.used, quota.pending, quota.available, quota.quota
    );

    let sick = LeaveDraft {
        leave_type: LeaveType::Sick,
        start_date: day + Duration::days(7),
        end_date: day + Duration::days(9),
        reason: "flu".to_string(),
        attachment: None,
        substitute: None,
    };
    if let Err(err) = service.submit(Some(&ploy), sick, at(day, 12, 0)) {
        println!("- Three-day sick leave without certificate: refused, {err}");
    }

    Ok(())
}

fn print_history(request: &LeaveRequest) {
    println!("  Audit trail:");
    for entry in &request.audit_log {
        println!("    {} {}", entry.timestamp, entry.summary());
    }
}
