//! Inbound response actions, validated at the transport boundary

use crate::{AttendanceStatus, RaidError, RaidId, RaidResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What a user pressed. Validated before reaching the response processor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Join,
    Leave,
    Maybe,
    PlusOne,
}

impl Action {
    /// Verb used in callback payloads
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Join => "join",
            Action::Leave => "leave",
            Action::Maybe => "maybe",
            Action::PlusOne => "plus1",
        }
    }

    /// `Leave` is recorded as `NotGoing`, never as a removal.
    pub fn status(&self) -> AttendanceStatus {
        match self {
            Action::Join => AttendanceStatus::Going,
            Action::Leave => AttendanceStatus::NotGoing,
            Action::Maybe => AttendanceStatus::Maybe,
            Action::PlusOne => AttendanceStatus::PlusOne,
        }
    }

    /// Payload to attach to a button for `raid_id`.
    pub fn payload_for(&self, raid_id: &RaidId) -> String {
        format!("{}_{}", self.verb(), raid_id.as_uuid())
    }
}

impl From<Action> for AttendanceStatus {
    fn from(action: Action) -> Self {
        action.status()
    }
}

impl FromStr for Action {
    type Err = RaidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "join" | "yes" | "going" => Ok(Action::Join),
            "leave" | "no" | "not_going" => Ok(Action::Leave),
            "maybe" => Ok(Action::Maybe),
            "plus1" | "+1" | "plus" | "plus_one" => Ok(Action::PlusOne),
            _ => Err(RaidError::InvalidStatus(s.to_string())),
        }
    }
}

/// A raw callback payload split into its raid and (not yet validated) verb.
///
/// Accepts `"<verb>_<raid>"` and `"<verb>:<raid>"`. The verb is kept raw so
/// the processor can validate it after the raid lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackPayload {
    pub raid_id: RaidId,
    pub verb: String,
}

impl CallbackPayload {
    pub fn parse(raw: &str) -> RaidResult<Self> {
        let (verb, raid) = raw
            .split_once(['_', ':'])
            .ok_or_else(|| RaidError::InvalidStatus(raw.to_string()))?;
        let raid_id = raid
            .parse::<RaidId>()
            .map_err(|_| RaidError::InvalidRequest(format!("malformed raid id '{}'", raid)))?;
        Ok(Self {
            raid_id,
            verb: verb.to_string(),
        })
    }

    pub fn action(&self) -> RaidResult<Action> {
        self.verb.parse()
    }
}
