//! Raid storage abstractions.
//!
//! This crate defines the persistence contract for the raid coordination core:
//! - raid records and their `Open -> Closed` lifecycle
//! - the attendance ledger, one entry per `(raid, user)`
//!
//! Ledger writes are conditional on the raid still accepting responses, and
//! that check happens inside the same atomic step as the write, so a closed
//! raid's ledger is frozen regardless of caller timing.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryRaidStorage;
pub use traits::{AttendanceStore, CloseOutcome, LedgerWrite, RaidStorage, RaidStore};
