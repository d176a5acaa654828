//! Read-only views derived from attendance records

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use geoattend_api::{AttendanceRecord, AttendanceStatus, WorkHours};
use geoattend_util::{EmployeeId, TeamId, days_in_range};
use serde::{Deserialize, Serialize};

/// Attendance counts over an inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttendanceStatistics {
    /// Calendar days in the range, not records found
    pub total_days: i64,
    /// Days checked in and not flagged late
    pub present_days: i64,
    /// Days flagged late, whatever the final status
    pub late_days: i64,
    /// Total minus present minus late, never negative
    pub absent_days: i64,
    pub attendance_percentage: f64,
}

impl AttendanceStatistics {
    /// LATE is counted apart from present, and absence is derived by
    /// subtraction so days without any record count as absent.
    pub fn compute(records: &[AttendanceRecord], start: NaiveDate, end: NaiveDate) -> Self {
        let total_days = days_in_range(start, end);
        let in_range = records.iter().filter(|r| r.day >= start && r.day <= end);

        let (mut present_days, mut late_days) = (0i64, 0i64);
        for record in in_range {
            if record.is_absent() {
                continue;
            }
            if record.late {
                late_days += 1;
            } else {
                present_days += 1;
            }
        }

        let absent_days = (total_days - present_days - late_days).max(0);
        let attendance_percentage = if total_days > 0 {
            present_days as f64 * 100.0 / total_days as f64
        } else {
            0.0
        };

        Self {
            total_days,
            present_days,
            late_days,
            absent_days,
            attendance_percentage,
        }
    }
}

/// Records plus statistics for one employee over a range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceReport {
    pub employee_id: EmployeeId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub records: Vec<AttendanceRecord>,
    pub statistics: AttendanceStatistics,
    pub generated_at: DateTime<Local>,
}

/// Today's state of one team member, for a manager dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMemberStatus {
    pub employee_id: EmployeeId,
    pub team_id: TeamId,
    /// ABSENT when there is no record yet
    pub status: AttendanceStatus,
    pub check_in_time: Option<DateTime<Local>>,
    pub check_out_time: Option<DateTime<Local>>,
}

impl TeamMemberStatus {
    pub fn from_record(employee_id: EmployeeId, team_id: TeamId, record: Option<&AttendanceRecord>) -> Self {
        let status = match record {
            None => AttendanceStatus::Absent,
            Some(r) if r.is_absent() => AttendanceStatus::Absent,
            Some(r) if r.check_out_time.is_some() => AttendanceStatus::CheckedOut,
            Some(_) => AttendanceStatus::CheckedIn,
        };

        Self {
            employee_id,
            team_id,
            status,
            check_in_time: record.and_then(|r| r.check_in_time),
            check_out_time: record.and_then(|r| r.check_out_time),
        }
    }
}

/// An employee's work hours with the derived check-in/out boundaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkHoursView {
    /// False when the employee has no team or the team has no start time
    pub configured: bool,
    pub message: Option<String>,
    pub team_id: Option<TeamId>,
    pub team_name: Option<String>,
    pub hours: Option<WorkHours>,
    pub earliest_check_in: Option<NaiveTime>,
    pub latest_check_in: Option<NaiveTime>,
    pub earliest_check_out: Option<NaiveTime>,
}

impl WorkHoursView {
    pub fn unconfigured(message: impl Into<String>) -> Self {
        Self {
            configured: false,
            message: Some(message.into()),
            team_id: None,
            team_name: None,
            hours: None,
            earliest_check_in: None,
            latest_check_in: None,
            earliest_check_out: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use geoattend_api::Point;
    use geoattend_util::ZoneId;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn record(d: u32, status: AttendanceStatus) -> AttendanceRecord {
        let at = Local.with_ymd_and_hms(2025, 6, d, 9, 0, 0).unwrap();
        let mut r = AttendanceRecord::checked_in(
            EmployeeId::new("e1"),
            ZoneId::new("hq"),
            at,
            Point::new(0.0, 0.0),
            None,
        );
        r.status = status;
        r.late = status == AttendanceStatus::Late;
        r
    }

    #[test]
    fn counts_by_subtraction() {
        let records = vec![
            record(2, AttendanceStatus::CheckedOut),
            record(3, AttendanceStatus::CheckedIn),
            record(4, AttendanceStatus::Late),
            record(5, AttendanceStatus::Absent),
        ];

        // 2..=11 is ten calendar days
        let stats = AttendanceStatistics::compute(&records, date(2), date(11));
        assert_eq!(stats.total_days, 10);
        assert_eq!(stats.present_days, 2);
        assert_eq!(stats.late_days, 1);
        assert_eq!(stats.absent_days, 7);
        assert!((stats.attendance_percentage - 20.0).abs() < 1e-9);
    }

    #[test]
    fn empty_and_inverted_ranges() {
        let stats = AttendanceStatistics::compute(&[], date(2), date(2));
        assert_eq!(stats.total_days, 1);
        assert_eq!(stats.absent_days, 1);

        let stats = AttendanceStatistics::compute(&[record(2, AttendanceStatus::CheckedIn)], date(5), date(2));
        assert_eq!(stats.total_days, 0);
        assert_eq!(stats.present_days, 0);
        assert_eq!(stats.absent_days, 0);
        assert_eq!(stats.attendance_percentage, 0.0);
    }

    #[test]
    fn member_status_from_record() {
        let emp = EmployeeId::new("e1");
        let team = TeamId::new("ops");

        let none = TeamMemberStatus::from_record(emp.clone(), team.clone(), None);
        assert_eq!(none.status, AttendanceStatus::Absent);
        assert!(none.check_in_time.is_none());

        let mut r = record(2, AttendanceStatus::Late);
        let open = TeamMemberStatus::from_record(emp.clone(), team.clone(), Some(&r));
        assert_eq!(open.status, AttendanceStatus::CheckedIn);

        r.close(Local.with_ymd_and_hms(2025, 6, 2, 17, 0, 0).unwrap(), None, None);
        let closed = TeamMemberStatus::from_record(emp, team, Some(&r));
        assert_eq!(closed.status, AttendanceStatus::CheckedOut);
        assert!(closed.check_out_time.is_some());
    }
}
