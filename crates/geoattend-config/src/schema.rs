//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Geofence zones, in creation order
    #[serde(default)]
    pub zones: Vec<RawZone>,

    /// Teams and their work hours
    #[serde(default)]
    pub teams: Vec<RawTeam>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the attendance database
    pub data_dir: Option<PathBuf>,

    /// Absence sweep period in seconds (default: 300)
    pub absence_sweep_seconds: Option<u64>,

    /// Forced check-out sweep period in seconds (default: 300)
    pub auto_checkout_sweep_seconds: Option<u64>,

    /// Late-arrival sweep period in seconds (default: 300)
    pub late_sweep_seconds: Option<u64>,

    /// Check-ins after this time of day (HH:MM) are flagged late.
    /// The late sweep is disabled when unset.
    pub late_threshold: Option<String>,
}

/// Raw zone definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawZone {
    pub id: String,
    pub name: String,
    pub description: Option<String>,

    #[serde(default = "default_true")]
    pub active: bool,

    pub shape: RawZoneShape,
}

fn default_true() -> bool {
    true
}

/// Raw zone geometry
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawZoneShape {
    Circle {
        center: RawPoint,
        /// Kept signed so that zero and negative radii are reported, not rejected by serde
        radius_meters: f64,
    },
    Polygon {
        vertices: Vec<RawPoint>,
    },
}

/// Raw coordinate pair in degrees
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RawPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Raw team definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawTeam {
    pub id: String,
    pub name: String,
    pub manager_id: Option<String>,

    /// Member employee IDs
    #[serde(default)]
    pub employees: Vec<String>,

    /// Primary zone for the team
    pub zone_id: Option<String>,

    #[serde(default)]
    pub work_hours: Option<RawWorkHours>,
}

/// Raw work hours (all times in HH:MM format)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawWorkHours {
    pub start: Option<String>,
    pub end: Option<String>,
    pub check_in_deadline: Option<String>,
    pub check_out_allowed_from: Option<String>,
    pub check_in_buffer_minutes: Option<u32>,
    pub check_out_buffer_minutes: Option<u32>,
}
