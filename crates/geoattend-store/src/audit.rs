//! Audit event types

use chrono::{DateTime, Local, NaiveDate};
use geoattend_util::{EmployeeId, RecordId, TeamId, ZoneId};
use serde::{Deserialize, Serialize};

/// Types of audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Service started
    ServiceStarted,

    /// Service stopped
    ServiceStopped,

    /// Zones and teams seeded from configuration
    ConfigSeeded { zone_count: usize, team_count: usize },

    /// Zone created or updated
    ZoneSaved { zone_id: ZoneId, active: bool },

    /// Zone removed from the catalogue
    ZoneDeleted { zone_id: ZoneId },

    /// Team work hours changed
    WorkHoursUpdated { team_id: TeamId },

    /// Manual check-in
    CheckedIn {
        employee_id: EmployeeId,
        record_id: RecordId,
        zone_id: ZoneId,
    },

    /// Manual check-out
    CheckedOut {
        employee_id: EmployeeId,
        record_id: RecordId,
    },

    /// Re-entry detected from a location update
    AutoCheckedIn {
        employee_id: EmployeeId,
        record_id: RecordId,
        zone_id: ZoneId,
    },

    /// Exit detected from a location update
    AutoCheckedOut {
        employee_id: EmployeeId,
        record_id: RecordId,
    },

    /// Check-out forced at the end of work hours
    ForcedCheckOut {
        employee_id: EmployeeId,
        record_id: RecordId,
        at: DateTime<Local>,
    },

    /// Employee marked absent for a day
    MarkedAbsent {
        employee_id: EmployeeId,
        day: NaiveDate,
    },

    /// Record flagged as a late arrival
    MarkedLate {
        employee_id: EmployeeId,
        record_id: RecordId,
    },

    /// Background sweep finished
    SweepCompleted {
        sweep: String,
        examined: usize,
        changed: usize,
        failed: usize,
    },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Local>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self::at(event, geoattend_util::now())
    }

    /// Event stamped with an explicit time
    pub fn at(event: AuditEventType, timestamp: DateTime<Local>) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp,
            event,
        }
    }
}
