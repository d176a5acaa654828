//! Attendance operation errors

use chrono::{NaiveDate, NaiveTime};
use geoattend_store::StoreError;
use geoattend_util::{TeamId, ZoneId};
use thiserror::Error;

/// Why an attendance operation was rejected or failed.
///
/// Policy violations carry a message meant to be shown to the caller as-is.
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("You have been marked absent for today. Please contact your manager.")]
    MarkedAbsent,

    #[error("You are already checked in for today")]
    AlreadyCheckedIn,

    #[error("You are outside the designated area. Please move to your assigned location to check in.")]
    OutsideZone,

    #[error("Too early to check in. Earliest check-in time is {}", .earliest.format("%H:%M"))]
    TooEarly { earliest: NaiveTime },

    #[error("Check-in deadline {} has passed. You have been marked absent.", .deadline.format("%H:%M"))]
    DeadlinePassed { deadline: NaiveTime },

    #[error("No active check-in found")]
    NoActiveCheckIn,

    #[error("Check-out not allowed yet. Earliest check-out time is {}", .earliest.format("%H:%M"))]
    CheckOutTooEarly { earliest: NaiveTime },

    #[error("Zone not found: {0}")]
    ZoneNotFound(ZoneId),

    #[error("Zone already exists: {0}")]
    ZoneExists(ZoneId),

    #[error("Team not found: {0}")]
    TeamNotFound(TeamId),

    #[error("Invalid zone: {0}")]
    InvalidZone(String),

    #[error("Invalid work hours: {0}")]
    InvalidWorkHours(String),

    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Attendance lock poisoned")]
    LockPoisoned,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AttendanceError {
    /// A rejected request, as opposed to a missing entity or an internal failure
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            AttendanceError::MarkedAbsent
                | AttendanceError::AlreadyCheckedIn
                | AttendanceError::OutsideZone
                | AttendanceError::TooEarly { .. }
                | AttendanceError::DeadlinePassed { .. }
                | AttendanceError::NoActiveCheckIn
                | AttendanceError::CheckOutTooEarly { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AttendanceError::ZoneNotFound(_) | AttendanceError::TeamNotFound(_)
        )
    }
}

pub type AttendanceResult<T> = Result<T, AttendanceError>;
