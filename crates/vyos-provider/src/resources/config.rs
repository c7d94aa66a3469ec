use serde::{Deserialize, Serialize};

use vyos_session::{ConfigPath, Leaves};

use super::{single_leaves, Resource, ResourceKind};
use crate::error::ProviderResult;

/// One path with one value (`vyos_config`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigResource {
    /// Space-separated path, e.g. `system host-name`
    pub key: String,
    /// Value; empty for valueless nodes
    #[serde(default)]
    pub value: String,
}

impl ConfigResource {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Resource for ConfigResource {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Config
    }

    fn id(&self) -> String {
        self.key.clone()
    }

    fn root(&self) -> ProviderResult<ConfigPath> {
        Ok(ConfigPath::parse(&self.key)?)
    }

    fn desired(&self) -> ProviderResult<Leaves> {
        Ok(single_leaves([(self.root()?, self.value.clone())]))
    }
}
