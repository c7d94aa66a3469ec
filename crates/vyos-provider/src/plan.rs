//! Apply plans: the declared resources for one apply cycle.
//!
//! ```toml
//! [[config]]
//! key = "system host-name"
//! value = "r1"
//!
//! [[config_block]]
//! path = "service ssh"
//! configs = { port = "22" }
//!
//! [[config_block_tree]]
//! path = "interfaces ethernet eth1"
//! configs = { "description" = "lan", "address" = ["192.0.2.1/24"] }
//!
//! [[static_host_mapping]]
//! host = "nas"
//! ip = "192.0.2.10"
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ProviderResult};
use crate::resources::{ConfigBlock, ConfigBlockTree, ConfigResource, Resource, StaticHostMapping};

/// Resources declared for one apply cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApplyPlan {
    pub config: Vec<ConfigResource>,
    pub config_block: Vec<ConfigBlock>,
    pub config_block_tree: Vec<ConfigBlockTree>,
    pub static_host_mapping: Vec<StaticHostMapping>,
}

impl ApplyPlan {
    /// Loads and validates a plan file.
    pub fn load(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ProviderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let plan: Self = toml::from_str(&content).map_err(|e| ProviderError::Parse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;
        plan.validate()?;
        Ok(plan)
    }

    /// Returns every resource in the plan.
    pub fn resources(&self) -> Vec<Arc<dyn Resource>> {
        shared(&self.config)
            .chain(shared(&self.config_block))
            .chain(shared(&self.config_block_tree))
            .chain(shared(&self.static_host_mapping))
            .collect()
    }

    /// Number of declared resources
    pub fn len(&self) -> usize {
        self.config.len()
            + self.config_block.len()
            + self.config_block_tree.len()
            + self.static_host_mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks that every resource has a valid root and that no two roots
    /// overlap.
    pub fn validate(&self) -> ProviderResult<()> {
        let resources = self.resources();
        let mut roots = Vec::with_capacity(resources.len());
        for resource in &resources {
            resource.desired()?;
            roots.push((resource.root()?, resource));
        }

        for (i, (root, resource)) in roots.iter().enumerate() {
            for (other_root, other) in &roots[i + 1..] {
                if root.overlaps(other_root) {
                    return Err(ProviderError::Plan(format!(
                        "{} '{}' and {} '{}' manage overlapping paths '{}' and '{}'",
                        resource.kind(),
                        resource.id(),
                        other.kind(),
                        other.id(),
                        root,
                        other_root
                    )));
                }
            }
        }
        Ok(())
    }
}

fn shared<R>(items: &[R]) -> impl Iterator<Item = Arc<dyn Resource>> + '_
where
    R: Resource + Clone + 'static,
{
    items.iter().map(|r| Arc::new(r.clone()) as Arc<dyn Resource>)
}
