//! Notification types emitted by the attendance engine

use chrono::{DateTime, Local};
use geoattend_util::EmployeeId;
use serde::{Deserialize, Serialize};

use crate::API_VERSION;

/// Notification envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub employee_id: EmployeeId,
    pub payload: NotificationPayload,
}

impl Notification {
    pub fn new(employee_id: EmployeeId, timestamp: DateTime<Local>, payload: NotificationPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp,
            employee_id,
            payload,
        }
    }

    pub fn check_in(employee_id: EmployeeId, timestamp: DateTime<Local>, zone_name: impl Into<String>) -> Self {
        Self::new(
            employee_id,
            timestamp,
            NotificationPayload::CheckIn {
                zone_name: zone_name.into(),
            },
        )
    }

    pub fn check_out(employee_id: EmployeeId, timestamp: DateTime<Local>) -> Self {
        Self::new(employee_id, timestamp, NotificationPayload::CheckOut)
    }

    pub fn late(employee_id: EmployeeId, timestamp: DateTime<Local>) -> Self {
        Self::new(employee_id, timestamp, NotificationPayload::LateArrival)
    }

    /// Short title for display
    pub fn title(&self) -> &'static str {
        match self.payload {
            NotificationPayload::CheckIn { .. } => "New Check-In",
            NotificationPayload::CheckOut => "Check-Out Recorded",
            NotificationPayload::LateArrival => "Late Arrival Alert",
        }
    }

    /// Human-readable body
    pub fn message(&self) -> String {
        let when = geoattend_util::format_datetime_full(&self.timestamp);
        match &self.payload {
            NotificationPayload::CheckIn { zone_name } => {
                format!("{} checked in at {} at {}", self.employee_id, zone_name, when)
            }
            NotificationPayload::CheckOut => {
                format!("{} checked out at {}", self.employee_id, when)
            }
            NotificationPayload::LateArrival => {
                format!("{} arrived late at {}", self.employee_id, when)
            }
        }
    }
}

/// All notifications the engine emits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationPayload {
    CheckIn { zone_name: String },
    CheckOut,
    LateArrival,
}
