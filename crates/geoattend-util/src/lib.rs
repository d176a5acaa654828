//! Shared utilities for geoattend
//!
//! This crate provides:
//! - ID types (EmployeeId, ZoneId, TeamId, RecordId)
//! - Wall-clock helpers (mockable `now()`, time-of-day arithmetic)
//! - Default paths for config, data, and log directories

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
