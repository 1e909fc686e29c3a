//! End-to-end raid scenarios driven through the coordinator with a manual clock.

use chrono::{DateTime, Duration, TimeZone, Utc};
use raid_runtime::{Clock, InMemoryProfileDirectory, ManualClock, RaidCoordinator, RaidPolicy};
use raid_storage::InMemoryRaidStorage;
use raid_types::{AttendanceStatus, RaidError, RaidState, UserId};
use std::sync::Arc;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap()
}

fn coordinator() -> (Arc<RaidCoordinator>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    let coordinator = RaidCoordinator::new(
        Arc::new(InMemoryRaidStorage::new()),
        Arc::new(InMemoryProfileDirectory::new()),
        clock.clone(),
        RaidPolicy::default(),
    );
    (Arc::new(coordinator), clock)
}

#[tokio::test]
async fn heatran_raid_lifecycle() {
    let (coordinator, _) = coordinator();
    let u1 = UserId::new("U1");
    let u2 = UserId::new("U2");
    let u3 = UserId::new("U3");

    let opened = coordinator
        .open_raid("Heatran", false, std::time::Duration::from_secs(5 * 60), u1.clone())
        .await
        .unwrap();
    let raid_id = opened.raid.id;

    let entries = coordinator.entries_for(&raid_id).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].user_id, u1);
    assert_eq!(entries[0].status, AttendanceStatus::Going);

    let summary = coordinator
        .respond(&raid_id, &u2, AttendanceStatus::Maybe, t0() + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!((summary.going_count(), summary.maybe_count()), (1, 1));

    let summary = coordinator
        .respond(&raid_id, &u2, AttendanceStatus::Going, t0() + Duration::minutes(2))
        .await
        .unwrap();
    assert_eq!((summary.going_count(), summary.maybe_count()), (2, 0));
    assert_eq!(coordinator.entries_for(&raid_id).await.unwrap().len(), 2);

    let late = coordinator
        .respond(&raid_id, &u3, AttendanceStatus::Going, t0() + Duration::minutes(6))
        .await;
    assert_eq!(late.unwrap_err(), RaidError::RaidClosed(raid_id));
}

#[tokio::test]
async fn window_boundary_is_exclusive() {
    let (coordinator, _) = coordinator();
    let opened = coordinator
        .open_raid("Heatran", false, std::time::Duration::from_secs(5 * 60), UserId::new("U1"))
        .await
        .unwrap();
    let raid_id = opened.raid.id;

    let just_inside = t0() + Duration::minutes(5) - Duration::milliseconds(1);
    coordinator
        .respond(&raid_id, &UserId::new("U2"), AttendanceStatus::Going, just_inside)
        .await
        .unwrap();

    let at_expiry = coordinator
        .respond(&raid_id, &UserId::new("U3"), AttendanceStatus::Going, t0() + Duration::minutes(5))
        .await;
    assert_eq!(at_expiry.unwrap_err(), RaidError::RaidClosed(raid_id));
}

#[tokio::test]
async fn changed_status_keeps_first_position() {
    let (coordinator, _) = coordinator();
    let raid_id = coordinator
        .open_raid("Heatran", false, std::time::Duration::from_secs(10 * 60), UserId::new("U1"))
        .await
        .unwrap()
        .raid
        .id;

    for (offset, user) in ["U2", "U3", "U4"].into_iter().enumerate() {
        coordinator
            .respond(
                &raid_id,
                &UserId::new(user),
                AttendanceStatus::Maybe,
                t0() + Duration::seconds(offset as i64 + 1),
            )
            .await
            .unwrap();
    }
    for (offset, user) in ["U4", "U2", "U3"].into_iter().enumerate() {
        coordinator
            .respond(
                &raid_id,
                &UserId::new(user),
                AttendanceStatus::Going,
                t0() + Duration::seconds(offset as i64 + 10),
            )
            .await
            .unwrap();
    }

    let summary = coordinator.summary(&raid_id, t0() + Duration::minutes(1)).await.unwrap();
    let order: Vec<_> = summary.going.iter().map(|p| p.user_id.as_str().to_string()).collect();
    assert_eq!(order, vec!["U1", "U2", "U3", "U4"]);
}

#[tokio::test]
async fn sweep_closes_without_gating_responses() {
    let (coordinator, clock) = coordinator();
    let raid_id = coordinator
        .open_raid("Heatran", false, std::time::Duration::from_secs(60), UserId::new("U1"))
        .await
        .unwrap()
        .raid
        .id;

    clock.advance(Duration::minutes(2));

    // Not swept yet, but already refused
    let before = coordinator
        .respond(&raid_id, &UserId::new("U2"), AttendanceStatus::Going, clock.now())
        .await;
    assert_eq!(before.unwrap_err(), RaidError::RaidClosed(raid_id));
    assert_eq!(
        coordinator.summary(&raid_id, clock.now()).await.unwrap().state,
        RaidState::Open
    );

    let (scheduler, _rx) = coordinator.expiry_scheduler(std::time::Duration::from_secs(30));
    let report = scheduler.sweep_once(clock.now()).await.unwrap();
    assert_eq!(report.closed, vec![raid_id]);
    assert_eq!(
        coordinator.summary(&raid_id, clock.now()).await.unwrap().state,
        RaidState::Closed
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_same_user_resolves_to_one_status() {
    let (coordinator, _) = coordinator();
    let raid_id = coordinator
        .open_raid("Heatran", false, std::time::Duration::from_secs(5 * 60), UserId::new("U1"))
        .await
        .unwrap()
        .raid
        .id;
    let user = UserId::new("U2");

    let statuses = [AttendanceStatus::Going, AttendanceStatus::Maybe];
    let mut handles = Vec::new();
    for round in 0..50 {
        let coordinator = coordinator.clone();
        let user = user.clone();
        let status = statuses[round % 2];
        handles.push(tokio::spawn(async move {
            coordinator
                .respond(&raid_id, &user, status, t0() + Duration::seconds(30))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let entries = coordinator.entries_for(&raid_id).await.unwrap();
    let mine: Vec<_> = entries.iter().filter(|e| e.user_id == user).collect();
    assert_eq!(mine.len(), 1);
    assert!(statuses.contains(&mine[0].status));
    assert_eq!(entries.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_users_are_all_recorded() {
    let (coordinator, _) = coordinator();
    let raid_id = coordinator
        .open_raid("Heatran", true, std::time::Duration::from_secs(5 * 60), UserId::new("U1"))
        .await
        .unwrap()
        .raid
        .id;

    let mut handles = Vec::new();
    for n in 0..40 {
        let coordinator = coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator
                .respond(
                    &raid_id,
                    &UserId::new(format!("trainer-{}", n)),
                    AttendanceStatus::PlusOne,
                    t0() + Duration::seconds(n),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let summary = coordinator.summary(&raid_id, t0()).await.unwrap();
    assert_eq!(summary.plus_one_count(), 40);
    assert_eq!(summary.expected_headcount, 1 + 40 * 2);
}

#[tokio::test]
async fn response_before_opening_is_rejected() {
    let (coordinator, _) = coordinator();
    let raid_id = coordinator
        .open_raid("Heatran", false, std::time::Duration::from_secs(5 * 60), UserId::new("U1"))
        .await
        .unwrap()
        .raid
        .id;

    let early = coordinator
        .respond(&raid_id, &UserId::new("U2"), AttendanceStatus::Going, t0() - Duration::hours(1))
        .await;
    assert!(matches!(early, Err(RaidError::InvalidRequest(_))));

    coordinator
        .respond(&raid_id, &UserId::new("U2"), AttendanceStatus::Going, t0() + Duration::seconds(5))
        .await
        .unwrap();
    let summary = coordinator.summary(&raid_id, t0()).await.unwrap();
    let order: Vec<_> = summary.going.iter().map(|p| p.user_id.as_str().to_string()).collect();
    assert_eq!(order, vec!["U1", "U2"]);
}
