//! Coordinated access to a VyOS configuration session.
//!
//! A VyOS device exposes one mutable configuration session. Changes are
//! path-based set/delete mutations against the running configuration and
//! only survive a reboot once an explicit save runs. Several declarative
//! resources may change disjoint subtrees in the same apply cycle, possibly
//! concurrently. This crate is the piece that keeps that safe:
//!
//! - [`ConfigPath`] / [`ConfigEntry`]: the unit of change
//! - [`batch`]: batch validation and deletions-before-additions ordering
//! - [`SessionClient`]: the transport boundary (HTTP lives in `vyos-client`)
//! - [`Coordinator`]: serializes batches, saves and reads against one session
//!   and tracks whether anything is unsaved
//! - [`SaveDirective`]: whether and where the save/commit step persists
//! - [`error`]: transport, mutation and save failures
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vyos_session::{config_entries, Coordinator, SaveDirective};
//!
//! let coordinator = Arc::new(Coordinator::new(client));
//!
//! coordinator
//!     .mutate(config_entries! {
//!         delete "interfaces ethernet eth0 address",
//!         set "interfaces ethernet eth0 address" => "10.0.0.1/24",
//!     })
//!     .await?;
//!
//! // Once per apply cycle
//! coordinator.conditional_save(&SaveDirective::default()).await?;
//! ```

pub mod batch;
pub mod client;
pub mod coordinator;
pub mod directive;
pub mod entry;
pub mod error;
pub mod tree;

// Re-export commonly used items at crate root
pub use client::SessionClient;
pub use coordinator::{Coordinator, MutationReport, SaveOutcome, SessionPhase, SessionStats};
pub use directive::{SaveDirective, SaveTarget};
pub use entry::{ConfigEntry, ConfigPath, Operation};
pub use error::{MutationError, PathError, SaveError, TransportError, TransportResult};
pub use tree::Leaves;

// Cancellation handle accepted by the `*_with_cancel` operations.
pub use tokio_util::sync::CancellationToken;
