//! Tunables for raid creation, listing, and rendering

use serde::{Deserialize, Serialize};

/// Where a user who changes status appears in their new group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    /// Keep the position of the user's first response
    #[default]
    FirstResponse,
    /// Move the user to the end on every change
    LatestResponse,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RaidPolicy {
    pub min_invite_minutes: u64,
    pub max_invite_minutes: u64,
    pub default_invite_minutes: u64,
    /// Max raids in the open listing, 0 for unlimited
    pub open_listing_limit: usize,
    pub ordering: OrderingPolicy,
}

impl Default for RaidPolicy {
    fn default() -> Self {
        Self {
            min_invite_minutes: 1,
            max_invite_minutes: 60,
            default_invite_minutes: 5,
            open_listing_limit: 10,
            ordering: OrderingPolicy::FirstResponse,
        }
    }
}
