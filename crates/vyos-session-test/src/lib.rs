//! Test infrastructure for the VyOS session coordinator
//!
//! Provides:
//! - An in-memory device that records every call with its time window
//! - Fixtures for common configuration trees
//! - Verification helpers for serialization and persistence checks

pub mod device;
pub mod fixtures;
mod verification;

pub use device::{CallKind, CallRecord, MemoryDevice};
pub use fixtures::*;
pub use verification::*;
