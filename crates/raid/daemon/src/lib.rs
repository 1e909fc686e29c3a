//! raidd library
//!
//! - Layered configuration
//! - Storage backend selection
//! - Daemon lifecycle with the periodic expiry sweep

pub mod config;
pub mod error;
pub mod server;
pub mod storage;

pub use config::RaiddConfig;
pub use error::{DaemonError, DaemonResult};
pub use server::Daemon;
pub use storage::StorageBackend;
