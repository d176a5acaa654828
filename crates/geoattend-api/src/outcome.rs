//! Caller-facing results of attendance operations
//!
//! The status tag set is the protocol surface outer layers (HTTP, CLI)
//! preserve verbatim.

use serde::{Deserialize, Serialize};

use crate::AttendanceRecord;

/// Closed set of status tags returned by every state-machine operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusTag {
    CheckedIn,
    CheckedOut,
    AutoCheckedIn,
    AutoCheckedOut,
    AwaitingFirstCheckin,
    Outside,
    Absent,
}

impl StatusTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTag::CheckedIn => "CHECKED_IN",
            StatusTag::CheckedOut => "CHECKED_OUT",
            StatusTag::AutoCheckedIn => "AUTO_CHECKED_IN",
            StatusTag::AutoCheckedOut => "AUTO_CHECKED_OUT",
            StatusTag::AwaitingFirstCheckin => "AWAITING_FIRST_CHECKIN",
            StatusTag::Outside => "OUTSIDE",
            StatusTag::Absent => "ABSENT",
        }
    }

    /// Whether this outcome changed the stored record
    pub fn is_transition(&self) -> bool {
        matches!(
            self,
            StatusTag::AutoCheckedIn | StatusTag::AutoCheckedOut
        )
    }
}

impl std::fmt::Display for StatusTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful attendance operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceOutcome {
    pub status: StatusTag,
    pub message: String,
    pub zone_name: Option<String>,
    /// Today's record after the operation, if one exists
    pub record: Option<AttendanceRecord>,
}

impl AttendanceOutcome {
    pub fn new(status: StatusTag, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            zone_name: None,
            record: None,
        }
    }

    pub fn with_zone(mut self, zone_name: impl Into<String>) -> Self {
        self.zone_name = Some(zone_name.into());
        self
    }

    pub fn with_record(mut self, record: AttendanceRecord) -> Self {
        self.record = Some(record);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_serialize_verbatim() {
        let tags = [
            StatusTag::CheckedIn,
            StatusTag::CheckedOut,
            StatusTag::AutoCheckedIn,
            StatusTag::AutoCheckedOut,
            StatusTag::AwaitingFirstCheckin,
            StatusTag::Outside,
            StatusTag::Absent,
        ];

        for tag in tags {
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json, format!("\"{}\"", tag.as_str()));
        }
    }

    #[test]
    fn outcome_builder() {
        let outcome = AttendanceOutcome::new(StatusTag::AwaitingFirstCheckin, "Check in manually")
            .with_zone("HQ");
        assert_eq!(outcome.zone_name.as_deref(), Some("HQ"));
        assert!(outcome.record.is_none());
        assert!(!outcome.status.is_transition());
    }
}
