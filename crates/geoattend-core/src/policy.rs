//! Work-hour policy resolution

use chrono::NaiveTime;
use geoattend_api::WorkHours;
use geoattend_store::{Store, StoreResult};
use geoattend_util::{EmployeeId, minus_minutes_clamped, plus_minutes_clamped};
use serde::{Deserialize, Serialize};

/// Check-in window after start when no deadline is configured
pub const DEFAULT_CHECK_IN_GRACE_MINUTES: u32 = 120;

/// An enforced work-hour policy. Exists only for teams with a start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPolicy {
    pub start: NaiveTime,
    pub end: Option<NaiveTime>,
    pub check_in_deadline: Option<NaiveTime>,
    pub check_out_allowed_from: Option<NaiveTime>,
    pub check_in_buffer_minutes: u32,
    pub check_out_buffer_minutes: u32,
}

impl WorkPolicy {
    /// None when the hours have no start time (unconfigured)
    pub fn from_hours(hours: &WorkHours) -> Option<Self> {
        Some(Self {
            start: hours.start?,
            end: hours.end,
            check_in_deadline: hours.check_in_deadline,
            check_out_allowed_from: hours.check_out_allowed_from,
            check_in_buffer_minutes: hours.check_in_buffer_minutes,
            check_out_buffer_minutes: hours.check_out_buffer_minutes,
        })
    }

    /// Start minus the check-in buffer, never before midnight
    pub fn earliest_check_in(&self) -> NaiveTime {
        minus_minutes_clamped(self.start, self.check_in_buffer_minutes)
    }

    /// The deadline if set, otherwise two hours after start
    pub fn latest_check_in(&self) -> NaiveTime {
        self.check_in_deadline
            .unwrap_or_else(|| plus_minutes_clamped(self.start, DEFAULT_CHECK_IN_GRACE_MINUTES))
    }

    /// None means check-out is always allowed
    pub fn earliest_check_out(&self) -> Option<NaiveTime> {
        self.check_out_allowed_from
            .map(|from| minus_minutes_clamped(from, self.check_out_buffer_minutes))
    }
}

/// Resolve the policy that applies to an employee.
///
/// Employees without a team, and teams without a start time, have no
/// policy. That is the common case, not an error.
pub fn resolve_for(store: &dyn Store, employee_id: &EmployeeId) -> StoreResult<Option<WorkPolicy>> {
    Ok(store
        .team_for_employee(employee_id)?
        .and_then(|team| WorkPolicy::from_hours(&team.work_hours)))
}
