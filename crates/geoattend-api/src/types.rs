//! Shared domain types for geoattend

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use geoattend_util::{EmployeeId, RecordId, TeamId, ZoneId};
use serde::{Deserialize, Serialize};

/// A geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Zone kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneKind {
    Circle,
    Polygon,
}

/// Zone geometry. The variant is the zone's kind, so exactly one shape
/// payload exists per zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZoneShape {
    Circle { center: Point, radius_meters: u32 },
    /// Implicitly closed: the last vertex connects back to the first
    Polygon { vertices: Vec<Point> },
}

impl ZoneShape {
    pub fn kind(&self) -> ZoneKind {
        match self {
            ZoneShape::Circle { .. } => ZoneKind::Circle,
            ZoneShape::Polygon { .. } => ZoneKind::Polygon,
        }
    }
}

/// A named geofence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub description: Option<String>,
    pub shape: ZoneShape,
    pub active: bool,
    pub created_at: DateTime<Local>,
}

impl Zone {
    pub fn kind(&self) -> ZoneKind {
        self.shape.kind()
    }
}

/// Team work-hour configuration, as set by a manager. All boundaries are
/// optional; a team without a start time has no enforced policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkHours {
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    pub check_in_deadline: Option<NaiveTime>,
    pub check_out_allowed_from: Option<NaiveTime>,
    #[serde(default = "default_check_in_buffer")]
    pub check_in_buffer_minutes: u32,
    #[serde(default)]
    pub check_out_buffer_minutes: u32,
}

/// Default grace period before the work start time
pub const DEFAULT_CHECK_IN_BUFFER_MINUTES: u32 = 15;

fn default_check_in_buffer() -> u32 {
    DEFAULT_CHECK_IN_BUFFER_MINUTES
}

impl Default for WorkHours {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            check_in_deadline: None,
            check_out_allowed_from: None,
            check_in_buffer_minutes: DEFAULT_CHECK_IN_BUFFER_MINUTES,
            check_out_buffer_minutes: 0,
        }
    }
}

impl WorkHours {
    /// True if any time-of-day boundary is set
    pub fn has_any_boundary(&self) -> bool {
        self.start.is_some()
            || self.end.is_some()
            || self.check_in_deadline.is_some()
            || self.check_out_allowed_from.is_some()
    }

    /// Check that the configured boundaries are ordered sensibly
    pub fn check_consistency(&self) -> Result<(), String> {
        if let (Some(start), Some(end)) = (self.start, self.end)
            && start >= end
        {
            return Err(format!("start {} must be before end {}", start, end));
        }
        if let (Some(start), Some(deadline)) = (self.start, self.check_in_deadline)
            && deadline < start
        {
            return Err(format!(
                "check-in deadline {} is before start {}",
                deadline, start
            ));
        }
        if let (Some(start), Some(from)) = (self.start, self.check_out_allowed_from)
            && from < start
        {
            return Err(format!(
                "check-out allowed from {} is before start {}",
                from, start
            ));
        }
        Ok(())
    }
}

/// A team of employees sharing a work-hour policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub manager_id: Option<EmployeeId>,
    pub employee_ids: Vec<EmployeeId>,
    pub zone_id: Option<ZoneId>,
    pub work_hours: WorkHours,
}

/// Attendance status of a daily record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    CheckedIn,
    CheckedOut,
    Late,
    /// Terminal for the day
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::CheckedIn => "CHECKED_IN",
            AttendanceStatus::CheckedOut => "CHECKED_OUT",
            AttendanceStatus::Late => "LATE",
            AttendanceStatus::Absent => "ABSENT",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record per (employee, calendar day)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: RecordId,
    pub employee_id: EmployeeId,
    pub day: NaiveDate,
    /// Zone of the first check-in of the day
    pub zone_id: Option<ZoneId>,
    pub check_in_time: Option<DateTime<Local>>,
    pub check_out_time: Option<DateTime<Local>>,
    pub check_in_point: Option<Point>,
    pub check_out_point: Option<Point>,
    pub accuracy_meters: Option<f32>,
    pub status: AttendanceStatus,
    /// Flagged as a late arrival. Survives check-out and re-entry.
    #[serde(default)]
    pub late: bool,
}

impl AttendanceRecord {
    /// A fresh record for the first check-in of the day
    pub fn checked_in(
        employee_id: EmployeeId,
        zone_id: ZoneId,
        at: DateTime<Local>,
        point: Point,
        accuracy_meters: Option<f32>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            employee_id,
            day: at.date_naive(),
            zone_id: Some(zone_id),
            check_in_time: Some(at),
            check_out_time: None,
            check_in_point: Some(point),
            check_out_point: None,
            accuracy_meters,
            status: AttendanceStatus::CheckedIn,
            late: false,
        }
    }

    /// An absence record with no check-in
    pub fn absent(employee_id: EmployeeId, day: NaiveDate) -> Self {
        Self {
            id: RecordId::new(),
            employee_id,
            day,
            zone_id: None,
            check_in_time: None,
            check_out_time: None,
            check_in_point: None,
            check_out_point: None,
            accuracy_meters: None,
            status: AttendanceStatus::Absent,
            late: false,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.status == AttendanceStatus::Absent
    }

    pub fn has_checked_in(&self) -> bool {
        self.check_in_time.is_some()
    }

    /// Checked in and not yet checked out (CHECKED_IN, or LATE while present)
    pub fn is_open(&self) -> bool {
        !self.is_absent() && self.check_in_time.is_some() && self.check_out_time.is_none()
    }

    /// Re-enter CHECKED_IN after a check-out on the same day
    pub fn reopen(&mut self, point: Point, accuracy_meters: Option<f32>) {
        self.check_out_time = None;
        self.check_out_point = None;
        self.check_in_point = Some(point);
        self.accuracy_meters = accuracy_meters;
        self.status = if self.late {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::CheckedIn
        };
    }

    /// Flag a late arrival. The record stays open.
    pub fn mark_late(&mut self) {
        self.late = true;
        self.status = AttendanceStatus::Late;
    }

    /// Close the record at the given time
    pub fn close(&mut self, at: DateTime<Local>, point: Option<Point>, accuracy_meters: Option<f32>) {
        self.check_out_time = Some(at);
        if point.is_some() {
            self.check_out_point = point;
        }
        if accuracy_meters.is_some() {
            self.accuracy_meters = accuracy_meters;
        }
        self.status = AttendanceStatus::CheckedOut;
    }
}
