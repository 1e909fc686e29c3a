//! Identity collaborator: read-only trainer profile lookup

use async_trait::async_trait;
use raid_storage::StorageResult;
use raid_types::{TrainerProfile, UserId};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::warn;

/// Profiles resolved for one render, keyed deterministically.
pub type ProfileMap = BTreeMap<UserId, TrainerProfile>;

/// Read-only lookup of display data for a user.
///
/// `Ok(None)` means the user never registered. Errors are treated the same
/// way by the runtime: the participant renders as unregistered.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn lookup(&self, user_id: &UserId) -> StorageResult<Option<TrainerProfile>>;
}

/// Resolve every user in `users`, skipping unknown ones.
pub(crate) async fn resolve_profiles(directory: &dyn ProfileDirectory, users: &[&UserId]) -> ProfileMap {
    let mut resolved = ProfileMap::new();
    for &user_id in users {
        if resolved.contains_key(user_id) {
            continue;
        }
        match directory.lookup(user_id).await {
            Ok(Some(profile)) => {
                resolved.insert(user_id.clone(), profile);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Profile lookup failed, rendering as unregistered");
            }
        }
    }
    resolved
}

/// Map-backed directory for development and tests.
#[derive(Default)]
pub struct InMemoryProfileDirectory {
    profiles: RwLock<HashMap<UserId, TrainerProfile>>,
}

impl InMemoryProfileDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: impl IntoIterator<Item = (UserId, TrainerProfile)>) -> Self {
        Self {
            profiles: RwLock::new(profiles.into_iter().collect()),
        }
    }

    pub async fn insert(&self, user_id: UserId, profile: TrainerProfile) {
        self.profiles.write().await.insert(user_id, profile);
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryProfileDirectory {
    async fn lookup(&self, user_id: &UserId) -> StorageResult<Option<TrainerProfile>> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raid_storage::StorageError;

    struct BrokenDirectory;

    #[async_trait]
    impl ProfileDirectory for BrokenDirectory {
        async fn lookup(&self, _user_id: &UserId) -> StorageResult<Option<TrainerProfile>> {
            Err(StorageError::Connection("profile service down".into()))
        }
    }

    #[tokio::test]
    async fn test_resolve_skips_unregistered() {
        let directory = InMemoryProfileDirectory::with_profiles([(
            UserId::new("u1"),
            TrainerProfile::new("Ash"),
        )]);
        let users = [UserId::new("u1"), UserId::new("u2"), UserId::new("u1")];

        let resolved = resolve_profiles(&directory, &users.iter().collect::<Vec<_>>()).await;
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[&UserId::new("u1")].display_name, "Ash");
    }

    #[tokio::test]
    async fn test_lookup_failure_is_not_fatal() {
        let users = [UserId::new("u1")];
        let resolved = resolve_profiles(&BrokenDirectory, &[&users[0]]).await;
        assert!(resolved.is_empty());
    }
}
