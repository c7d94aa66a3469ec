use serde::{Deserialize, Serialize};

use vyos_session::{ConfigPath, Leaves};

use super::{single_leaves, Resource, ResourceKind};
use crate::error::ProviderResult;

const STATIC_HOST_ROOT: [&str; 3] = ["system", "static-host-mapping", "host-name"];

/// Static host name to address mapping (`vyos_static_host_mapping`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticHostMapping {
    pub host: String,
    pub ip: String,
}

impl StaticHostMapping {
    pub fn new(host: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ip: ip.into(),
        }
    }
}

impl Resource for StaticHostMapping {
    fn kind(&self) -> ResourceKind {
        ResourceKind::StaticHostMapping
    }

    fn id(&self) -> String {
        self.host.clone()
    }

    fn root(&self) -> ProviderResult<ConfigPath> {
        Ok(ConfigPath::from_segments(
            STATIC_HOST_ROOT.iter().copied().chain([self.host.as_str()]),
        )?)
    }

    fn desired(&self) -> ProviderResult<Leaves> {
        Ok(single_leaves([(self.root()?.join("inet")?, self.ip.clone())]))
    }
}
