//! Declarative resources and the adapter that reconciles them.
//!
//! Every resource owns one subtree of the device configuration (its
//! [`Resource::root`]) and describes the leaves it wants under it. The
//! [`ResourceAdapter`] reads the subtree back, plans the difference and
//! submits one mutation batch through the shared coordinator. Adapters never
//! save; the apply cycle saves once at the end.

mod adapter;
mod block;
mod config;
mod static_host;

pub use adapter::{ResourceAdapter, ResourceChange};
pub use block::{BlockValue, ConfigBlock, ConfigBlockTree};
pub use config::ConfigResource;
pub use static_host::StaticHostMapping;

use std::fmt;

use vyos_session::{ConfigPath, Leaves};

use crate::error::ProviderResult;

/// Resource type, named as in plan files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Single path/value pair
    Config,
    /// Flat map of children under one path
    ConfigBlock,
    /// Nested map of dot-separated sub-paths under one path
    ConfigBlockTree,
    /// `system static-host-mapping` entry
    StaticHostMapping,
}

impl ResourceKind {
    /// Type name used in plans and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Config => "vyos_config",
            ResourceKind::ConfigBlock => "vyos_config_block",
            ResourceKind::ConfigBlockTree => "vyos_config_block_tree",
            ResourceKind::StaticHostMapping => "vyos_static_host_mapping",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A piece of device configuration owned by one declaration.
pub trait Resource: fmt::Debug + Send + Sync {
    /// Resource type
    fn kind(&self) -> ResourceKind;

    /// Identifier, unique per kind within a plan
    fn id(&self) -> String;

    /// Subtree this resource owns
    fn root(&self) -> ProviderResult<ConfigPath>;

    /// Leaves this resource wants under [`Resource::root`]
    fn desired(&self) -> ProviderResult<Leaves>;
}

/// Builds a `Leaves` with one value per path.
pub(crate) fn single_leaves<I>(items: I) -> Leaves
where
    I: IntoIterator<Item = (ConfigPath, String)>,
{
    items.into_iter().map(|(path, value)| (path, vec![value])).collect()
}
