//! Attendance engine for geoattendd
//!
//! This crate is the heart of geoattendd, containing:
//! - Geofence matching (circles and polygons on the WGS-84 sphere)
//! - Work-hour policy (earliest and latest check-in, earliest check-out)
//! - The per-(employee, day) attendance state machine
//! - Absence, late-arrival and end-of-day sweeps

mod admin;
mod engine;
mod error;
pub mod geometry;
mod locks;
pub mod policy;
mod stats;
mod sweeps;
mod zones;

pub use engine::*;
pub use error::*;
pub use locks::*;
pub use policy::WorkPolicy;
pub use stats::*;
pub use sweeps::*;
pub use zones::*;
