//! Ledger and rendering properties over arbitrary response sequences.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use raid_runtime::{InMemoryProfileDirectory, ManualClock, RaidCoordinator, RaidPolicy};
use raid_storage::InMemoryRaidStorage;
use raid_types::{AttendanceStatus, RaidError, UserId};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

const WINDOW_SECS: i64 = 300;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap()
}

#[derive(Clone, Debug)]
struct Response {
    user: usize,
    status: AttendanceStatus,
    /// Seconds after opening; some land past the window
    offset: i64,
}

fn status_strategy() -> impl Strategy<Value = AttendanceStatus> {
    prop_oneof![
        Just(AttendanceStatus::Going),
        Just(AttendanceStatus::NotGoing),
        Just(AttendanceStatus::Maybe),
        Just(AttendanceStatus::PlusOne),
    ]
}

fn responses_strategy() -> impl Strategy<Value = Vec<Response>> {
    proptest::collection::vec(
        (0usize..5, status_strategy(), 0i64..WINDOW_SECS + 60)
            .prop_map(|(user, status, offset)| Response { user, status, offset }),
        0..40,
    )
}

fn coordinator() -> RaidCoordinator {
    RaidCoordinator::new(
        Arc::new(InMemoryRaidStorage::new()),
        Arc::new(InMemoryProfileDirectory::new()),
        Arc::new(ManualClock::new(t0())),
        RaidPolicy::default(),
    )
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

proptest! {
    #[test]
    fn property_last_accepted_write_wins(responses in responses_strategy()) {
        runtime().block_on(async move {
            let coordinator = coordinator();
            let initiator = UserId::new("initiator");
            let raid_id = coordinator
                .open_raid("Heatran", false, std::time::Duration::from_secs(WINDOW_SECS as u64), initiator.clone())
                .await
                .unwrap()
                .raid
                .id;

            let mut expected: HashMap<UserId, AttendanceStatus> = HashMap::new();
            expected.insert(initiator, AttendanceStatus::Going);

            for response in &responses {
                let user = UserId::new(format!("user-{}", response.user));
                let result = coordinator
                    .respond(&raid_id, &user, response.status, t0() + Duration::seconds(response.offset))
                    .await;
                if response.offset < WINDOW_SECS {
                    assert!(result.is_ok());
                    expected.insert(user, response.status);
                } else {
                    assert_eq!(result.unwrap_err(), RaidError::RaidClosed(raid_id));
                }
            }

            let entries = coordinator.entries_for(&raid_id).await.unwrap();
            let actual: HashMap<_, _> = entries
                .iter()
                .map(|entry| (entry.user_id.clone(), entry.status))
                .collect();
            assert_eq!(actual, expected);
        });
    }

    #[test]
    fn property_entries_have_unique_users(responses in responses_strategy()) {
        runtime().block_on(async move {
            let coordinator = coordinator();
            let raid_id = coordinator
                .open_raid("Heatran", false, std::time::Duration::from_secs(WINDOW_SECS as u64), UserId::new("initiator"))
                .await
                .unwrap()
                .raid
                .id;

            for response in &responses {
                let _ = coordinator
                    .respond(
                        &raid_id,
                        &UserId::new(format!("user-{}", response.user)),
                        response.status,
                        t0() + Duration::seconds(response.offset),
                    )
                    .await;
            }

            let entries = coordinator.entries_for(&raid_id).await.unwrap();
            let users: BTreeSet<_> = entries.iter().map(|entry| entry.user_id.clone()).collect();
            assert_eq!(users.len(), entries.len());
        });
    }

    #[test]
    fn property_render_is_idempotent(responses in responses_strategy(), at in 0i64..WINDOW_SECS * 2) {
        runtime().block_on(async move {
            let coordinator = coordinator();
            let raid_id = coordinator
                .open_raid("Heatran", true, std::time::Duration::from_secs(WINDOW_SECS as u64), UserId::new("initiator"))
                .await
                .unwrap()
                .raid
                .id;

            for response in &responses {
                let _ = coordinator
                    .respond(
                        &raid_id,
                        &UserId::new(format!("user-{}", response.user)),
                        response.status,
                        t0() + Duration::seconds(response.offset),
                    )
                    .await;
            }

            let now = t0() + Duration::seconds(at);
            let first = coordinator.summary(&raid_id, now).await.unwrap();
            let second = coordinator.summary(&raid_id, now).await.unwrap();
            assert_eq!(first.text(), second.text());
            assert_eq!(first, second);

            let counted = first.going_count() + first.maybe_count() + first.plus_one_count() + first.not_going_count();
            assert_eq!(counted, coordinator.entries_for(&raid_id).await.unwrap().len());
        });
    }
}
