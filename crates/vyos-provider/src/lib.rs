//! Declarative configuration provider for VyOS devices.
//!
//! # Responsibilities
//!
//! - Load and validate provider settings (`url`, `key`, `save`, `save_file`)
//! - Reconcile declared resources against the device through one shared
//!   session coordinator
//! - Save once per apply cycle, and only when every resource succeeded
//!
//! # Resources
//!
//! | Type | Owns |
//! |------|------|
//! | `vyos_config` | One path and its value |
//! | `vyos_config_block` | Direct children of one node |
//! | `vyos_config_block_tree` | A nested subtree under one node |
//! | `vyos_static_host_mapping` | `system static-host-mapping host-name <host>` |
//!
//! The `vyos_config` data source reads one path without touching the
//! session's unsaved state.
//!
//! # Example
//!
//! ```ignore
//! use vyos_provider::{ApplyPlan, Provider, ProviderConfig};
//!
//! let provider = Provider::configure(ProviderConfig::load("/etc/vyos/provider.toml")?)?;
//! let report = provider.apply(&ApplyPlan::load("plan.toml")?).await?;
//! ```

pub mod config;
pub mod data_source;
pub mod diff;
pub mod error;
pub mod plan;
pub mod provider;
pub mod resources;

pub use config::ProviderConfig;
pub use data_source::{ConfigDataSource, ConfigValue};
pub use error::{ProviderError, ProviderResult};
pub use plan::ApplyPlan;
pub use provider::{ApplyReport, Provider, ResourceOutcome};
pub use resources::{
    ConfigBlock, ConfigBlockTree, ConfigResource, Resource, ResourceAdapter, ResourceKind,
    StaticHostMapping,
};
