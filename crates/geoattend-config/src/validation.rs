//! Configuration validation

use crate::schema::{RawConfig, RawPoint, RawTeam, RawWorkHours, RawZone, RawZoneShape};
use chrono::NaiveTime;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Zone '{zone_id}': {message}")]
    ZoneError { zone_id: String, message: String },

    #[error("Team '{team_id}': {message}")]
    TeamError { team_id: String, message: String },

    #[error("Duplicate zone ID: {0}")]
    DuplicateZoneId(String),

    #[error("Duplicate team ID: {0}")]
    DuplicateTeamId(String),

    #[error("Invalid time format '{value}': {message}")]
    InvalidTimeFormat { value: String, message: String },

    #[error("Team '{team_id}' references unknown zone '{zone_id}'")]
    UnknownZone { team_id: String, zone_id: String },

    #[error("Employee '{employee_id}' is in both team '{first_team}' and team '{second_team}'")]
    EmployeeInMultipleTeams {
        employee_id: String,
        first_team: String,
        second_team: String,
    },

    #[error("Global config error: {0}")]
    GlobalError(String),
}

/// Validate a raw configuration, collecting every problem found
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_service(config));

    let mut zone_ids = HashSet::new();
    for zone in &config.zones {
        if !zone_ids.insert(zone.id.as_str()) {
            errors.push(ValidationError::DuplicateZoneId(zone.id.clone()));
        }
        errors.extend(validate_zone(zone));
    }

    let mut team_ids = HashSet::new();
    let mut membership: HashMap<&str, &str> = HashMap::new();
    for team in &config.teams {
        if !team_ids.insert(team.id.as_str()) {
            errors.push(ValidationError::DuplicateTeamId(team.id.clone()));
        }

        for employee in &team.employees {
            match membership.get(employee.as_str()) {
                Some(first) if *first != team.id => {
                    errors.push(ValidationError::EmployeeInMultipleTeams {
                        employee_id: employee.clone(),
                        first_team: first.to_string(),
                        second_team: team.id.clone(),
                    });
                }
                Some(_) => {
                    errors.push(ValidationError::TeamError {
                        team_id: team.id.clone(),
                        message: format!("employee '{}' is listed more than once", employee),
                    });
                }
                None => {
                    membership.insert(employee.as_str(), team.id.as_str());
                }
            }
        }

        errors.extend(validate_team(team, &zone_ids));
    }

    errors
}

fn validate_service(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let service = &config.service;

    for (name, value) in [
        ("absence_sweep_seconds", service.absence_sweep_seconds),
        ("auto_checkout_sweep_seconds", service.auto_checkout_sweep_seconds),
        ("late_sweep_seconds", service.late_sweep_seconds),
    ] {
        if value == Some(0) {
            errors.push(ValidationError::GlobalError(format!(
                "{} must be greater than zero",
                name
            )));
        }
    }

    if let Some(threshold) = &service.late_threshold
        && let Err(e) = parse_time(threshold)
    {
        errors.push(ValidationError::InvalidTimeFormat {
            value: threshold.clone(),
            message: e,
        });
    }

    errors
}

fn validate_zone(zone: &RawZone) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let zone_error = |message: String| ValidationError::ZoneError {
        zone_id: zone.id.clone(),
        message,
    };

    if zone.id.trim().is_empty() {
        errors.push(zone_error("id cannot be empty".into()));
    }
    if zone.name.trim().is_empty() {
        errors.push(zone_error("name cannot be empty".into()));
    }

    match &zone.shape {
        RawZoneShape::Circle {
            center,
            radius_meters,
        } => {
            if !point_in_range(center) {
                errors.push(zone_error(format!(
                    "center ({}, {}) is out of range",
                    center.lat, center.lng
                )));
            }
            if !(*radius_meters > 0.0) {
                errors.push(zone_error(format!(
                    "radius must be positive, got {}",
                    radius_meters
                )));
            } else if radius_meters.fract() != 0.0 || *radius_meters > f64::from(u32::MAX) {
                errors.push(zone_error(format!(
                    "radius must be a whole number of meters, got {}",
                    radius_meters
                )));
            }
        }
        RawZoneShape::Polygon { vertices } => {
            if vertices.len() < 3 {
                errors.push(zone_error(format!(
                    "polygon needs at least 3 vertices, got {}",
                    vertices.len()
                )));
            }
            for (i, vertex) in vertices.iter().enumerate() {
                if !point_in_range(vertex) {
                    errors.push(zone_error(format!(
                        "vertex {} ({}, {}) is out of range",
                        i, vertex.lat, vertex.lng
                    )));
                }
            }
        }
    }

    errors
}

fn point_in_range(p: &RawPoint) -> bool {
    (-90.0..=90.0).contains(&p.lat) && (-180.0..=180.0).contains(&p.lng)
}

fn validate_team(team: &RawTeam, zone_ids: &HashSet<&str>) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if team.id.trim().is_empty() {
        errors.push(ValidationError::TeamError {
            team_id: team.id.clone(),
            message: "id cannot be empty".into(),
        });
    }

    if let Some(zone_id) = &team.zone_id
        && !zone_ids.contains(zone_id.as_str())
    {
        errors.push(ValidationError::UnknownZone {
            team_id: team.id.clone(),
            zone_id: zone_id.clone(),
        });
    }

    if let Some(hours) = &team.work_hours {
        errors.extend(validate_work_hours(hours, &team.id));
    }

    errors
}

fn validate_work_hours(hours: &RawWorkHours, team_id: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut all_parsed = true;

    for value in [
        &hours.start,
        &hours.end,
        &hours.check_in_deadline,
        &hours.check_out_allowed_from,
    ]
    .into_iter()
    .flatten()
    {
        if let Err(e) = parse_time(value) {
            all_parsed = false;
            errors.push(ValidationError::InvalidTimeFormat {
                value: value.clone(),
                message: e,
            });
        }
    }

    // Ordering only makes sense once every boundary parsed
    if all_parsed
        && let Err(message) = crate::model::convert_work_hours(hours).check_consistency()
    {
        errors.push(ValidationError::TeamError {
            team_id: team_id.to_string(),
            message,
        });
    }

    errors
}

/// Parse HH:MM time format
pub fn parse_time(s: &str) -> Result<NaiveTime, String> {
    geoattend_util::parse_time_of_day(s)
}
