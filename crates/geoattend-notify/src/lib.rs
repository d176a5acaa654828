//! Notification sink interfaces for geoattendd
//!
//! The attendance engine hands every notification to a [`NotificationSink`]
//! and never fails an operation because delivery failed. This crate holds
//! the sink trait, a channel-backed sink for the service, the per-employee
//! session registry that fans notifications out, and a recording sink for
//! tests.

mod channel;
mod mock;
mod registry;
mod traits;

pub use channel::*;
pub use mock::*;
pub use registry::*;
pub use traits::*;
