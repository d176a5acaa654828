//! Validated configuration structures

use crate::schema::{RawConfig, RawPoint, RawServiceConfig, RawTeam, RawWorkHours, RawZone, RawZoneShape};
use crate::validation::parse_time;
use chrono::{DateTime, Local, NaiveTime};
use geoattend_api::{DEFAULT_CHECK_IN_BUFFER_MINUTES, Point, Team, WorkHours, Zone, ZoneShape};
use geoattend_util::{EmployeeId, TeamId, ZoneId, default_data_dir};
use std::path::PathBuf;
use std::time::Duration;

/// Default period for every background sweep
pub const DEFAULT_SWEEP_SECONDS: u64 = 300;

/// Validated configuration ready for use by the service
#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,

    /// Zones in creation order
    pub zones: Vec<Zone>,

    pub teams: Vec<Team>,
}

impl Config {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let created_at = geoattend_util::now();

        Self {
            service: ServiceConfig::from_raw(raw.service),
            zones: raw
                .zones
                .into_iter()
                .map(|z| convert_zone(z, created_at))
                .collect(),
            teams: raw.teams.into_iter().map(convert_team).collect(),
        }
    }

    /// Get zone by ID
    pub fn get_zone(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| &z.id == id)
    }

    /// Get team by ID
    pub fn get_team(&self, id: &TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| &t.id == id)
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub absence_sweep_interval: Duration,
    pub auto_checkout_sweep_interval: Duration,
    pub late_sweep_interval: Duration,
    /// None disables the late sweep
    pub late_threshold: Option<NaiveTime>,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        let interval = |secs: Option<u64>| Duration::from_secs(secs.unwrap_or(DEFAULT_SWEEP_SECONDS));

        Self {
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            absence_sweep_interval: interval(raw.absence_sweep_seconds),
            auto_checkout_sweep_interval: interval(raw.auto_checkout_sweep_seconds),
            late_sweep_interval: interval(raw.late_sweep_seconds),
            late_threshold: raw.late_threshold.as_deref().and_then(|s| parse_time(s).ok()),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_raw(RawServiceConfig::default())
    }
}

// Conversion helpers

fn convert_point(raw: RawPoint) -> Point {
    Point::new(raw.lat, raw.lng)
}

fn convert_zone(raw: RawZone, created_at: DateTime<Local>) -> Zone {
    let shape = match raw.shape {
        RawZoneShape::Circle {
            center,
            radius_meters,
        } => ZoneShape::Circle {
            center: convert_point(center),
            // Validated as a positive whole number that fits in u32
            radius_meters: radius_meters as u32,
        },
        RawZoneShape::Polygon { vertices } => ZoneShape::Polygon {
            vertices: vertices.into_iter().map(convert_point).collect(),
        },
    };

    Zone {
        id: ZoneId::new(raw.id),
        name: raw.name,
        description: raw.description,
        shape,
        active: raw.active,
        created_at,
    }
}

fn convert_team(raw: RawTeam) -> Team {
    Team {
        id: TeamId::new(raw.id),
        name: raw.name,
        manager_id: raw.manager_id.map(EmployeeId::new),
        employee_ids: raw.employees.into_iter().map(EmployeeId::new).collect(),
        zone_id: raw.zone_id.map(ZoneId::new),
        work_hours: raw
            .work_hours
            .as_ref()
            .map(convert_work_hours)
            .unwrap_or_default(),
    }
}

pub(crate) fn convert_work_hours(raw: &RawWorkHours) -> WorkHours {
    let time = |s: &Option<String>| s.as_deref().and_then(|s| parse_time(s).ok());

    WorkHours {
        start: time(&raw.start),
        end: time(&raw.end),
        check_in_deadline: time(&raw.check_in_deadline),
        check_out_allowed_from: time(&raw.check_out_allowed_from),
        check_in_buffer_minutes: raw
            .check_in_buffer_minutes
            .unwrap_or(DEFAULT_CHECK_IN_BUFFER_MINUTES),
        check_out_buffer_minutes: raw.check_out_buffer_minutes.unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_work_hours_defaults() {
        let raw = RawWorkHours {
            start: Some("09:00".into()),
            ..Default::default()
        };
        let hours = convert_work_hours(&raw);
        assert_eq!(hours.start, Some(t(9, 0)));
        assert_eq!(hours.end, None);
        assert_eq!(hours.check_in_buffer_minutes, 15);
        assert_eq!(hours.check_out_buffer_minutes, 0);
    }

    #[test]
    fn test_service_defaults() {
        let service = ServiceConfig::default();
        assert_eq!(service.absence_sweep_interval, Duration::from_secs(300));
        assert_eq!(service.late_sweep_interval, Duration::from_secs(300));
        assert!(service.late_threshold.is_none());
    }

    #[test]
    fn test_team_without_hours_has_no_boundaries() {
        let team = convert_team(RawTeam {
            id: "ops".into(),
            name: "Ops".into(),
            manager_id: Some("m1".into()),
            employees: vec!["e1".into()],
            zone_id: None,
            work_hours: None,
        });
        assert!(!team.work_hours.has_any_boundary());
        assert_eq!(team.manager_id, Some(EmployeeId::new("m1")));
    }
}
