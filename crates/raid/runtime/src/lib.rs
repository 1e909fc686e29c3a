//! Raid Coordination Runtime
//!
//! The components that keep a raid's attendance consistent while many users
//! respond at once:
//!
//! - [`RaidRegistry`]: raid records, lifecycle, identifiers
//! - [`AttendanceLedger`]: one entry per `(raid, user)`, source of truth for counts
//! - [`ResponseProcessor`]: validates and applies a response as one unit per user
//! - [`SummaryRenderer`]: pure `(raid, entries) -> Summary`
//! - [`ExpiryScheduler`]: periodic backstop closing raids past their window
//!
//! [`RaidCoordinator`] wires them together behind the inbound interface the
//! chat transport calls.

#![deny(unsafe_code)]

mod clock;
mod coordinator;
mod ledger;
mod policy;
mod processor;
mod profiles;
mod registry;
mod renderer;
mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::{OpenedRaid, RaidCoordinator};
pub use ledger::AttendanceLedger;
pub use policy::{OrderingPolicy, RaidPolicy};
pub use processor::ResponseProcessor;
pub use profiles::{InMemoryProfileDirectory, ProfileDirectory, ProfileMap};
pub use registry::RaidRegistry;
pub use renderer::{ListingLine, ParticipantView, Summary, SummaryRenderer};
pub use scheduler::{ExpiryScheduler, SweepReport};
