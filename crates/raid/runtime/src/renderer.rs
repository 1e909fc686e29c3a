//! Summary Renderer - pure function from raid state to display
//!
//! Given the same raid, entries, profiles and `now`, the output is identical,
//! byte for byte. Nothing here reads a clock or touches storage.

use crate::{OrderingPolicy, ProfileMap};
use chrono::{DateTime, Utc};
use raid_types::{AttendanceEntry, AttendanceStatus, Raid, RaidId, RaidState, UserId};
use serde::Serialize;
use std::fmt::Write as _;

/// One participant line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParticipantView {
    pub user_id: UserId,
    pub display_name: String,
    /// `Lvl 40 Yellow`, empty when unknown
    pub tag: String,
    pub trainer_code: Option<String>,
    pub registered: bool,
}

impl ParticipantView {
    fn resolve(user_id: &UserId, profiles: &ProfileMap) -> Self {
        match profiles.get(user_id) {
            Some(profile) => Self {
                user_id: user_id.clone(),
                display_name: profile.display_name.clone(),
                tag: profile.gamer_tag(),
                trainer_code: profile.trainer_code.clone(),
                registered: true,
            },
            None => Self {
                user_id: user_id.clone(),
                display_name: format!("unregistered ({})", user_id),
                tag: String::new(),
                trainer_code: None,
                registered: false,
            },
        }
    }

    fn line(&self) -> String {
        let mut line = format!("• {}", self.display_name);
        if !self.tag.is_empty() {
            let _ = write!(line, " {}", self.tag);
        }
        if let Some(code) = &self.trainer_code {
            let _ = write!(line, " - `{}`", code);
        }
        line
    }
}

/// Rendered view of a raid's current attendance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub raid_id: RaidId,
    pub subject: String,
    pub boosted: bool,
    pub state: RaidState,
    pub minutes_remaining: i64,
    pub initiator: ParticipantView,
    pub going: Vec<ParticipantView>,
    pub maybe: Vec<ParticipantView>,
    pub plus_one: Vec<ParticipantView>,
    pub not_going: Vec<ParticipantView>,
    /// `Going` plus two per `PlusOne` responder
    pub expected_headcount: u32,
}

impl Summary {
    pub fn going_count(&self) -> usize {
        self.going.len()
    }

    pub fn maybe_count(&self) -> usize {
        self.maybe.len()
    }

    pub fn plus_one_count(&self) -> usize {
        self.plus_one.len()
    }

    pub fn not_going_count(&self) -> usize {
        self.not_going.len()
    }

    /// Plain-text form handed to the transport.
    pub fn text(&self) -> String {
        let mut out = String::new();
        let boosted = if self.boosted { "☀️ BOOSTED" } else { "⚡ NORMAL" };
        let _ = writeln!(out, "{} {}", self.subject, boosted);
        let _ = writeln!(out, "Raid: {}", self.raid_id);

        let mut initiator = format!("Initiator: {}", self.initiator.display_name);
        if !self.initiator.tag.is_empty() {
            let _ = write!(initiator, " ({})", self.initiator.tag);
        }
        if let Some(code) = &self.initiator.trainer_code {
            let _ = write!(initiator, " - `{}`", code);
        }
        let _ = writeln!(out, "{}", initiator);

        match self.state {
            RaidState::Open => {
                let _ = writeln!(out, "Invites in: {} min", self.minutes_remaining);
                let _ = writeln!(out, "Status: Organizing - Stay online!");
            }
            RaidState::Closed => {
                let _ = writeln!(out, "Status: Closed");
            }
        }

        out.push('\n');
        write_group(&mut out, "✅ Going", &self.going);
        write_group(&mut out, "❓ Maybe", &self.maybe);
        write_group(&mut out, "👥 +1", &self.plus_one);
        let _ = writeln!(out, "❌ Not going: {}", self.not_going_count());
        let _ = write!(out, "Expected headcount: {}", self.expected_headcount);
        out
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text())
    }
}

fn write_group(out: &mut String, title: &str, members: &[ParticipantView]) {
    let _ = writeln!(out, "{} ({}):", title, members.len());
    for member in members {
        let _ = writeln!(out, "{}", member.line());
    }
}

/// One row of the open-raids listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ListingLine {
    pub raid_id: RaidId,
    pub subject: String,
    pub boosted: bool,
    pub initiator_name: String,
    pub minutes_remaining: i64,
    pub going_count: usize,
}

#[derive(Clone, Debug, Default)]
pub struct SummaryRenderer {
    ordering: OrderingPolicy,
}

impl SummaryRenderer {
    pub fn new(ordering: OrderingPolicy) -> Self {
        Self { ordering }
    }

    /// Render `raid` from a ledger snapshot.
    ///
    /// `entries` must come from the ledger, i.e. first responder first.
    pub fn render(
        &self,
        raid: &Raid,
        entries: &[AttendanceEntry],
        profiles: &ProfileMap,
        now: DateTime<Utc>,
    ) -> Summary {
        let mut ordered = entries.iter().collect::<Vec<_>>();
        match self.ordering {
            OrderingPolicy::FirstResponse => ordered.sort_by(|a, b| {
                a.first_responded_at
                    .cmp(&b.first_responded_at)
                    .then(a.sequence.cmp(&b.sequence))
            }),
            OrderingPolicy::LatestResponse => ordered.sort_by(|a, b| {
                a.updated_at
                    .cmp(&b.updated_at)
                    .then(a.sequence.cmp(&b.sequence))
            }),
        }

        let mut going = Vec::new();
        let mut maybe = Vec::new();
        let mut plus_one = Vec::new();
        let mut not_going = Vec::new();
        let mut expected_headcount = 0;

        for entry in ordered {
            let view = ParticipantView::resolve(&entry.user_id, profiles);
            expected_headcount += entry.status.headcount();
            match entry.status {
                AttendanceStatus::Going => going.push(view),
                AttendanceStatus::Maybe => maybe.push(view),
                AttendanceStatus::PlusOne => plus_one.push(view),
                AttendanceStatus::NotGoing => not_going.push(view),
            }
        }

        Summary {
            raid_id: raid.id,
            subject: raid.subject.clone(),
            boosted: raid.boosted,
            state: raid.state,
            minutes_remaining: raid.minutes_remaining(now),
            initiator: ParticipantView::resolve(&raid.initiator_id, profiles),
            going,
            maybe,
            plus_one,
            not_going,
            expected_headcount,
        }
    }

    pub fn listing_line(
        &self,
        raid: &Raid,
        entries: &[AttendanceEntry],
        profiles: &ProfileMap,
        now: DateTime<Utc>,
    ) -> ListingLine {
        ListingLine {
            raid_id: raid.id,
            subject: raid.subject.clone(),
            boosted: raid.boosted,
            initiator_name: ParticipantView::resolve(&raid.initiator_id, profiles).display_name,
            minutes_remaining: raid.minutes_remaining(now),
            going_count: entries
                .iter()
                .filter(|e| e.status == AttendanceStatus::Going)
                .count(),
        }
    }

    /// Text for the open-raids listing.
    pub fn render_listing(&self, lines: &[ListingLine]) -> String {
        if lines.is_empty() {
            return "📭 No active raids found!".to_string();
        }

        let mut out = String::from("🔥 ACTIVE RAIDS 🔥\n");
        for line in lines {
            let marker = if line.boosted { "☀️" } else { "⚡" };
            let _ = write!(
                out,
                "\n{}: {} {}\nBy: {} | ⏰ {}min left | 👥 {} going\n",
                line.raid_id,
                line.subject,
                marker,
                line.initiator_name,
                line.minutes_remaining,
                line.going_count
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use raid_types::{RaidSpec, Team, TrainerProfile};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn raid() -> Raid {
        let spec = RaidSpec::new(
            "heatran",
            true,
            std::time::Duration::from_secs(300),
            UserId::new("u1"),
        )
        .unwrap();
        Raid::open(spec, t0())
    }

    fn entry(raid: &Raid, user: &str, status: AttendanceStatus, first: i64, updated: i64, seq: u64) -> AttendanceEntry {
        AttendanceEntry {
            raid_id: raid.id,
            user_id: UserId::new(user),
            status,
            first_responded_at: t0() + Duration::seconds(first),
            updated_at: t0() + Duration::seconds(updated),
            sequence: seq,
        }
    }

    fn profiles() -> ProfileMap {
        let mut map = ProfileMap::new();
        map.insert(
            UserId::new("u1"),
            TrainerProfile::new("Ash")
                .with_level(40)
                .with_team(Team::Instinct)
                .with_code("1234 5678 9012"),
        );
        map
    }

    #[test]
    fn test_groups_and_counts() {
        let raid = raid();
        let entries = vec![
            entry(&raid, "u1", AttendanceStatus::Going, 0, 0, 1),
            entry(&raid, "u2", AttendanceStatus::Maybe, 10, 10, 2),
            entry(&raid, "u3", AttendanceStatus::PlusOne, 20, 20, 3),
            entry(&raid, "u4", AttendanceStatus::NotGoing, 30, 30, 4),
        ];
        let summary = SummaryRenderer::default().render(&raid, &entries, &profiles(), t0());

        assert_eq!(summary.going_count(), 1);
        assert_eq!(summary.maybe_count(), 1);
        assert_eq!(summary.plus_one_count(), 1);
        assert_eq!(summary.not_going_count(), 1);
        assert_eq!(summary.expected_headcount, 3);
        assert_eq!(summary.minutes_remaining, 5);
        assert_eq!(summary.initiator.display_name, "Ash");
        assert_eq!(summary.maybe[0].display_name, "unregistered (u2)");
    }

    #[test]
    fn test_text_is_stable() {
        let raid = raid();
        let entries = vec![
            entry(&raid, "u1", AttendanceStatus::Going, 0, 0, 1),
            entry(&raid, "u2", AttendanceStatus::Going, 10, 10, 2),
        ];
        let renderer = SummaryRenderer::default();
        let text = renderer
            .render(&raid, &entries, &profiles(), t0() + Duration::seconds(90))
            .text();

        let expected = format!(
            "Heatran ☀️ BOOSTED\n\
             Raid: {}\n\
             Initiator: Ash (Lvl 40 Yellow) - `1234 5678 9012`\n\
             Invites in: 3 min\n\
             Status: Organizing - Stay online!\n\
             \n\
             ✅ Going (2):\n\
             • Ash Lvl 40 Yellow - `1234 5678 9012`\n\
             • unregistered (u2)\n\
             ❓ Maybe (0):\n\
             👥 +1 (0):\n\
             ❌ Not going: 0\n\
             Expected headcount: 2",
            raid.id
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_ordering_policies() {
        let raid = raid();
        // u2 answered first but changed last
        let entries = vec![
            entry(&raid, "u2", AttendanceStatus::Going, 5, 50, 2),
            entry(&raid, "u3", AttendanceStatus::Going, 10, 10, 3),
        ];

        let first = SummaryRenderer::new(OrderingPolicy::FirstResponse)
            .render(&raid, &entries, &ProfileMap::new(), t0());
        assert_eq!(first.going[0].user_id, UserId::new("u2"));

        let latest = SummaryRenderer::new(OrderingPolicy::LatestResponse)
            .render(&raid, &entries, &ProfileMap::new(), t0());
        assert_eq!(latest.going[0].user_id, UserId::new("u3"));
    }

    #[test]
    fn test_timestamp_ties_break_on_sequence() {
        let raid = raid();
        let a = entry(&raid, "u2", AttendanceStatus::Maybe, 5, 5, 7);
        let b = entry(&raid, "u3", AttendanceStatus::Maybe, 5, 5, 3);
        let renderer = SummaryRenderer::default();

        let one = renderer.render(&raid, &[a.clone(), b.clone()], &ProfileMap::new(), t0());
        let two = renderer.render(&raid, &[b, a], &ProfileMap::new(), t0());
        assert_eq!(one, two);
        assert_eq!(one.maybe[0].user_id, UserId::new("u3"));
    }

    #[test]
    fn test_closed_raid_shows_no_time_left() {
        let mut raid = raid();
        raid.state = RaidState::Closed;
        let summary = SummaryRenderer::default().render(&raid, &[], &ProfileMap::new(), t0());
        assert_eq!(summary.minutes_remaining, 0);
        assert!(summary.text().contains("Status: Closed"));
        assert!(!summary.text().contains("Invites in"));
    }

    #[test]
    fn test_listing() {
        let raid = raid();
        let entries = vec![
            entry(&raid, "u1", AttendanceStatus::Going, 0, 0, 1),
            entry(&raid, "u2", AttendanceStatus::Maybe, 1, 1, 2),
        ];
        let renderer = SummaryRenderer::default();
        let line = renderer.listing_line(&raid, &entries, &profiles(), t0() + Duration::minutes(1));
        assert_eq!(line.going_count, 1);
        assert_eq!(line.minutes_remaining, 4);

        let text = renderer.render_listing(&[line]);
        assert!(text.starts_with("🔥 ACTIVE RAIDS 🔥"));
        assert!(text.contains("Heatran ☀️"));
        assert!(text.contains("By: Ash | ⏰ 4min left | 👥 1 going"));
        assert_eq!(renderer.render_listing(&[]), "📭 No active raids found!");
    }
}
