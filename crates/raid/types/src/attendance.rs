//! Attendance ledger entries

use crate::{RaidId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user's current response to a raid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Going,
    NotGoing,
    Maybe,
    /// Attends and brings one extra attendee
    PlusOne,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Going,
        AttendanceStatus::NotGoing,
        AttendanceStatus::Maybe,
        AttendanceStatus::PlusOne,
    ];

    /// Storage encoding
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Going => "going",
            AttendanceStatus::NotGoing => "not_going",
            AttendanceStatus::Maybe => "maybe",
            AttendanceStatus::PlusOne => "plus_one",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }

    /// Headcount this response contributes.
    pub fn headcount(&self) -> u32 {
        match self {
            AttendanceStatus::Going => 1,
            AttendanceStatus::PlusOne => 2,
            AttendanceStatus::NotGoing | AttendanceStatus::Maybe => 0,
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single current entry for a `(raid, user)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub raid_id: RaidId,
    pub user_id: UserId,
    pub status: AttendanceStatus,
    /// When the user first responded; kept across status changes
    pub first_responded_at: DateTime<Utc>,
    /// Timestamp of the last write
    pub updated_at: DateTime<Utc>,
    /// Ledger-assigned insertion order, breaks timestamp ties
    pub sequence: u64,
}
