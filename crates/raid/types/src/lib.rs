//! Raid Coordination Domain Types
//!
//! This crate defines the domain types shared by the raid coordination core:
//! the raid record and its lifecycle, the per-user attendance entry, the
//! tagged response actions accepted at the boundary, trainer profiles, and
//! the error taxonomy returned to callers.
//!
//! # Key Concepts
//!
//! - **Raid**: a time-boxed event with an invite window. Created `Open`,
//!   terminal once `Closed`.
//! - **Attendance entry**: one user's current response to a raid. At most one
//!   per `(raid, user)`.
//! - **Action**: the validated form of an inbound response
//!   (`Join | Leave | Maybe | PlusOne`).
//!
//! This is a pure types crate with no runtime dependencies. IDs use the
//! newtype pattern and implement `Display`.

#![deny(unsafe_code)]

mod action;
mod attendance;
mod errors;
mod ids;
mod profile;
mod raid;

pub use action::*;
pub use attendance::*;
pub use errors::*;
pub use ids::*;
pub use profile::*;
pub use raid::*;
