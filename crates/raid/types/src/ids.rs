//! Identifier newtypes

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Opaque raid identifier. Assigned at creation and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RaidId(uuid::Uuid);

impl RaidId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// Short display form (first 8 chars)
    pub fn short(&self) -> String {
        self.0.to_string().chars().take(8).collect()
    }
}

impl std::fmt::Display for RaidId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "raid-{}", self.0)
    }
}

impl FromStr for RaidId {
    type Err = uuid::Error;

    /// Accepts both the bare UUID and the `raid-` prefixed display form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("raid-").unwrap_or(s);
        uuid::Uuid::parse_str(raw).map(Self)
    }
}

/// Identity of a chat user, as handed to the core by the transport.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raid_id_parses_display_form() {
        let id = RaidId::generate();
        let parsed: RaidId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);

        let bare: RaidId = id.as_uuid().to_string().parse().unwrap();
        assert_eq!(bare, id);
    }

    #[test]
    fn raid_id_rejects_garbage() {
        assert!("raid-not-a-uuid".parse::<RaidId>().is_err());
    }
}
