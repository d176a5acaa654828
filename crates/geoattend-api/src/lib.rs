//! Shared domain types for geoattend
//!
//! This crate defines the types every other layer agrees on:
//! - Geography (points, zones and their shapes)
//! - Teams and their work-hour configuration
//! - Attendance records and statuses
//! - Caller-facing status tags and outcomes
//! - Notifications emitted by the engine

mod events;
mod outcome;
mod types;

pub use events::*;
pub use outcome::*;
pub use types::*;

/// Current API version, stamped on notifications
pub const API_VERSION: u32 = 1;
