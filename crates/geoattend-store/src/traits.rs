//! Store trait definitions

use chrono::NaiveDate;
use geoattend_api::{AttendanceRecord, Team, Zone};
use geoattend_util::{EmployeeId, TeamId, ZoneId};

use crate::{AuditEvent, StoreResult};

/// Main store trait
pub trait Store: Send + Sync {
    // Zones

    fn get_zone(&self, id: &ZoneId) -> StoreResult<Option<Zone>>;

    /// All zones in creation order
    fn list_zones(&self) -> StoreResult<Vec<Zone>>;

    /// Active zones in creation order
    fn list_active_zones(&self) -> StoreResult<Vec<Zone>>;

    /// Insert a zone, or update it in place keeping its creation order
    fn upsert_zone(&self, zone: &Zone) -> StoreResult<()>;

    /// Remove a zone. Returns false if it did not exist.
    fn delete_zone(&self, id: &ZoneId) -> StoreResult<bool>;

    // Teams

    fn get_team(&self, id: &TeamId) -> StoreResult<Option<Team>>;

    /// The team an employee belongs to, if any
    fn team_for_employee(&self, employee_id: &EmployeeId) -> StoreResult<Option<Team>>;

    fn list_teams(&self) -> StoreResult<Vec<Team>>;

    /// Insert or replace a team along with its membership
    fn upsert_team(&self, team: &Team) -> StoreResult<()>;

    /// Replace every team and membership with the given set, atomically
    fn replace_teams(&self, teams: &[Team]) -> StoreResult<()>;

    // Attendance records

    /// The record for an employee on a day
    fn get_record(&self, employee_id: &EmployeeId, day: NaiveDate) -> StoreResult<Option<AttendanceRecord>>;

    /// Insert or replace the record for its (employee, day)
    fn save_record(&self, record: &AttendanceRecord) -> StoreResult<()>;

    /// Insert the record only if none exists for its (employee, day).
    /// Returns true if it was inserted.
    fn insert_record_if_missing(&self, record: &AttendanceRecord) -> StoreResult<bool>;

    /// Every record for a day
    fn list_records_for_day(&self, day: NaiveDate) -> StoreResult<Vec<AttendanceRecord>>;

    /// An employee's records in the inclusive range, oldest first
    fn list_records_in_range(
        &self,
        employee_id: &EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>>;

    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
