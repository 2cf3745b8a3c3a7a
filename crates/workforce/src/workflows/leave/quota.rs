use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::domain::{LeaveDraft, LeaveRequest, LeaveStatus, LeaveType};

/// SICK requests spanning at least this many days need an attachment.
pub const MEDICAL_CERTIFICATE_THRESHOLD_DAYS: i64 = 3;

/// Annual day allowance per leave type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaTable(BTreeMap<LeaveType, i64>);

impl QuotaTable {
    pub fn standard() -> Self {
        Self(BTreeMap::from([
            (LeaveType::Vacation, 6),
            (LeaveType::Sick, 30),
            (LeaveType::Personal, 6),
            (LeaveType::Business, 10),
        ]))
    }

    pub fn with_quota(mut self, leave_type: LeaveType, days: i64) -> Self {
        self.0.insert(leave_type, days);
        self
    }

    pub fn days(&self, leave_type: LeaveType) -> i64 {
        self.0.get(&leave_type).copied().unwrap_or(0)
    }
}

impl Default for QuotaTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSummary {
    pub leave_type: LeaveType,
    pub year: i32,
    pub quota: i64,
    pub used: i64,
    pub pending: i64,
    /// May be negative when past grants exceed a later-reduced quota.
    pub available: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("end date precedes start date")]
    InvalidDateRange,
    #[error("sick leave of {days} days requires a medical certificate")]
    AttachmentRequired { days: i64 },
    #[error("requested {requested} days but only {available} available")]
    QuotaExceeded { requested: i64, available: i64 },
}

/// Snapshot-based quota math. Not isolated from concurrent submissions.
#[derive(Debug, Clone, Default)]
pub struct LeaveQuotaCalculator {
    quotas: QuotaTable,
}

impl LeaveQuotaCalculator {
    pub fn new(quotas: QuotaTable) -> Self {
        Self { quotas }
    }

    pub fn quotas(&self) -> &QuotaTable {
        &self.quotas
    }

    /// Usage for one leave type in `year`, counting requests by start date.
    pub fn summarize(
        &self,
        requests: &[LeaveRequest],
        leave_type: LeaveType,
        year: i32,
    ) -> QuotaSummary {
        let (used, pending) = requests
            .iter()
            .filter(|request| {
                request.leave_type == leave_type && request.start_date.year() == year
            })
            .fold((0, 0), |(used, pending), request| match request.status {
                LeaveStatus::Approved => (used + request.span_days(), pending),
                LeaveStatus::Pending => (used, pending + request.span_days()),
                LeaveStatus::Rejected => (used, pending),
            });

        let quota = self.quotas.days(leave_type);
        QuotaSummary {
            leave_type,
            year,
            quota,
            used,
            pending,
            available: quota - (used + pending),
        }
    }

    /// Admission check for a new request against the requester's history.
    pub fn admit(
        &self,
        draft: &LeaveDraft,
        history: &[LeaveRequest],
    ) -> Result<QuotaSummary, AdmissionError> {
        if draft.end_date < draft.start_date {
            return Err(AdmissionError::InvalidDateRange);
        }

        let requested = draft.span_days();
        if draft.leave_type == LeaveType::Sick
            && requested >= MEDICAL_CERTIFICATE_THRESHOLD_DAYS
            && !draft.has_attachment()
        {
            return Err(AdmissionError::AttachmentRequired { days: requested });
        }

        let summary = self.summarize(history, draft.leave_type, draft.start_date.year());
        if requested > summary.available {
            return Err(AdmissionError::QuotaExceeded {
                requested,
                available: summary.available,
            });
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::workflows::directory::EmployeeId;
    use crate::workflows::leave::chain::ApprovalPointer;
    use crate::workflows::leave::domain::LeaveRequestId;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn request(
        leave_type: LeaveType,
        start: NaiveDate,
        days: i64,
        status: LeaveStatus,
    ) -> LeaveRequest {
        LeaveRequest {
            id: LeaveRequestId(format!("leave-{start}-{days}")),
            requester: EmployeeId::new("u5"),
            leave_type,
            start_date: start,
            end_date: start + chrono::Duration::days(days - 1),
            reason: String::new(),
            attachment: None,
            substitute: None,
            status,
            current_approver: ApprovalPointer::Completed,
            audit_log: Vec::new(),
            revision: 0,
        }
    }

    fn draft(leave_type: LeaveType, start: NaiveDate, end: NaiveDate) -> LeaveDraft {
        LeaveDraft {
            leave_type,
            start_date: start,
            end_date: end,
            reason: "unwell".to_string(),
            attachment: None,
            substitute: None,
        }
    }

    #[test]
    fn summary_splits_used_and_pending() {
        let history = [
            request(LeaveType::Sick, date(2025, 2, 3), 10, LeaveStatus::Approved),
            request(LeaveType::Sick, date(2025, 6, 2), 5, LeaveStatus::Pending),
            request(LeaveType::Sick, date(2025, 7, 1), 4, LeaveStatus::Rejected),
            request(LeaveType::Vacation, date(2025, 8, 1), 2, LeaveStatus::Approved),
            request(LeaveType::Sick, date(2024, 12, 30), 3, LeaveStatus::Approved),
        ];

        let summary = LeaveQuotaCalculator::default().summarize(&history, LeaveType::Sick, 2025);
        assert_eq!(summary.quota, 30);
        assert_eq!(summary.used, 10);
        assert_eq!(summary.pending, 5);
        assert_eq!(summary.available, 15);
    }

    #[test]
    fn request_larger_than_available_is_refused() {
        let history = [
            request(LeaveType::Sick, date(2025, 2, 3), 10, LeaveStatus::Approved),
            request(LeaveType::Sick, date(2025, 6, 2), 5, LeaveStatus::Pending),
        ];
        let mut large = draft(LeaveType::Sick, date(2025, 9, 1), date(2025, 9, 20));
        large.attachment = Some("cert.pdf".to_string());

        assert_eq!(
            LeaveQuotaCalculator::default().admit(&large, &history),
            Err(AdmissionError::QuotaExceeded {
                requested: 20,
                available: 15
            })
        );
    }

    #[test]
    fn exact_fit_is_admitted() {
        let history = [request(
            LeaveType::Vacation,
            date(2025, 3, 3),
            4,
            LeaveStatus::Approved,
        )];
        let fits = draft(LeaveType::Vacation, date(2025, 11, 20), date(2025, 11, 21));

        let summary = LeaveQuotaCalculator::default()
            .admit(&fits, &history)
            .unwrap();
        assert_eq!(summary.available, 2);
    }

    #[test]
    fn inverted_range_is_refused_first() {
        let inverted = draft(LeaveType::Sick, date(2025, 9, 10), date(2025, 9, 1));
        assert_eq!(
            LeaveQuotaCalculator::default().admit(&inverted, &[]),
            Err(AdmissionError::InvalidDateRange)
        );
    }

    #[test]
    fn long_sick_leave_needs_attachment() {
        let calculator = LeaveQuotaCalculator::default();
        let two_days = draft(LeaveType::Sick, date(2025, 9, 1), date(2025, 9, 2));
        assert!(calculator.admit(&two_days, &[]).is_ok());

        let mut three_days = draft(LeaveType::Sick, date(2025, 9, 1), date(2025, 9, 3));
        assert_eq!(
            calculator.admit(&three_days, &[]),
            Err(AdmissionError::AttachmentRequired { days: 3 })
        );

        three_days.attachment = Some("   ".to_string());
        assert!(calculator.admit(&three_days, &[]).is_err());

        three_days.attachment = Some("uploads/cert-0901.jpg".to_string());
        assert!(calculator.admit(&three_days, &[]).is_ok());
    }

    #[test]
    fn attachment_rule_only_applies_to_sick_leave() {
        let business = draft(LeaveType::Business, date(2025, 9, 1), date(2025, 9, 5));
        assert!(LeaveQuotaCalculator::default().admit(&business, &[]).is_ok());
    }

    #[test]
    fn admission_year_follows_start_date() {
        let history = [request(
            LeaveType::Personal,
            date(2025, 5, 5),
            6,
            LeaveStatus::Approved,
        )];
        let next_year = draft(LeaveType::Personal, date(2026, 1, 2), date(2026, 1, 3));
        let summary = LeaveQuotaCalculator::default()
            .admit(&next_year, &history)
            .unwrap();
        assert_eq!(summary.year, 2026);
        assert_eq!(summary.used, 0);
    }

    #[test]
    fn custom_table_overrides_defaults() {
        let calculator =
            LeaveQuotaCalculator::new(QuotaTable::standard().with_quota(LeaveType::Vacation, 12));
        let summary = calculator.summarize(&[], LeaveType::Vacation, 2025);
        assert_eq!(summary.available, 12);
    }
}
