//! Raid records and their lifecycle

use crate::{RaidError, RaidId, RaidResult, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle state of a raid. `Closed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RaidState {
    #[default]
    Open,
    Closed,
}

impl RaidState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RaidState::Open => "open",
            RaidState::Closed => "closed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "open" => Some(RaidState::Open),
            "closed" => Some(RaidState::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for RaidState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time-boxed coordination event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Raid {
    pub id: RaidId,
    /// Free-form label, e.g. the raid boss
    pub subject: String,
    /// Informational only
    pub boosted: bool,
    pub invite_window: Duration,
    /// Always implicitly a participant
    pub initiator_id: UserId,
    pub state: RaidState,
    pub created_at: DateTime<Utc>,
}

impl Raid {
    /// Build a fresh `Open` raid from a validated spec.
    pub fn open(spec: RaidSpec, created_at: DateTime<Utc>) -> Self {
        Self {
            id: RaidId::generate(),
            subject: spec.subject,
            boosted: spec.boosted,
            invite_window: spec.invite_window,
            initiator_id: spec.initiator_id,
            state: RaidState::Open,
            created_at,
        }
    }

    /// Instant at which the raid stops accepting responses.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + chrono::Duration::milliseconds(self.invite_window.as_millis() as i64)
    }

    /// Whether the invite window has elapsed as of `as_of`.
    pub fn is_expired_at(&self, as_of: DateTime<Utc>) -> bool {
        as_of >= self.expires_at()
    }

    /// Whether `as_of` falls before the raid was opened.
    pub fn predates(&self, as_of: DateTime<Utc>) -> bool {
        as_of < self.created_at
    }

    /// Open and `as_of` lies inside `[created_at, expires_at)`.
    pub fn accepts_responses_at(&self, as_of: DateTime<Utc>) -> bool {
        self.state == RaidState::Open && !self.predates(as_of) && !self.is_expired_at(as_of)
    }

    /// Whole minutes left in the invite window, never negative.
    pub fn minutes_remaining(&self, now: DateTime<Utc>) -> i64 {
        if self.state == RaidState::Closed {
            return 0;
        }
        (self.expires_at() - now).num_minutes().max(0)
    }
}

/// Request to open a raid, normalised by [`RaidSpec::new`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidSpec {
    pub subject: String,
    pub boosted: bool,
    pub invite_window: Duration,
    pub initiator_id: UserId,
}

impl RaidSpec {
    /// Trim and capitalise the subject. Fails on an empty subject.
    pub fn new(
        subject: &str,
        boosted: bool,
        invite_window: Duration,
        initiator_id: UserId,
    ) -> RaidResult<Self> {
        let subject = normalize_subject(subject)
            .ok_or_else(|| RaidError::InvalidRequest("raid subject must not be empty".into()))?;
        Ok(Self {
            subject,
            boosted,
            invite_window,
            initiator_id,
        })
    }

    /// Check the invite window lies within `[min, max]` whole minutes.
    pub fn validate_window(&self, min_minutes: u64, max_minutes: u64) -> RaidResult<()> {
        let secs = self.invite_window.as_secs();
        if self.invite_window.subsec_nanos() != 0 || secs % 60 != 0 {
            return Err(RaidError::InvalidRequest(
                "invite window must be a whole number of minutes".into(),
            ));
        }
        let minutes = secs / 60;
        if minutes < min_minutes || minutes > max_minutes {
            return Err(RaidError::InvalidRequest(format!(
                "invite window must be between {} and {} minutes, got {}",
                min_minutes, max_minutes, minutes
            )));
        }
        Ok(())
    }
}

/// First letter upper-case, the rest lower-case.
pub fn normalize_subject(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    let mut out: String = first.to_uppercase().collect();
    out.extend(chars.flat_map(char::to_lowercase));
    Some(out)
}

/// Parse the boosted flag as typed by users.
pub fn parse_boosted(raw: &str) -> RaidResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" => Ok(true),
        "no" | "n" | "false" => Ok(false),
        other => Err(RaidError::InvalidRequest(format!(
            "boosted must be 'yes' or 'no', got '{}'",
            other
        ))),
    }
}
