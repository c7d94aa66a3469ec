use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use vyos_session::{ConfigPath, Leaves};

use super::{Resource, ResourceKind};
use crate::error::ProviderResult;

/// A leaf value in a block: one string, or a list for multi-value leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockValue {
    One(String),
    Many(Vec<String>),
}

impl BlockValue {
    fn values(&self) -> Vec<String> {
        match self {
            BlockValue::One(value) => vec![value.clone()],
            BlockValue::Many(values) => values.clone(),
        }
    }
}

impl From<&str> for BlockValue {
    fn from(value: &str) -> Self {
        BlockValue::One(value.to_string())
    }
}

/// Children of one node (`vyos_config_block`).
///
/// Each key of `configs` is a direct child name of `path`. Children on the
/// device that are not in `configs` are deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigBlock {
    /// Space-separated path of the parent node
    pub path: String,
    #[serde(default)]
    pub configs: BTreeMap<String, BlockValue>,
}

impl ConfigBlock {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            configs: BTreeMap::new(),
        }
    }

    /// Adds a child leaf.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<BlockValue>) -> Self {
        self.configs.insert(name.into(), value.into());
        self
    }
}

impl Resource for ConfigBlock {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ConfigBlock
    }

    fn id(&self) -> String {
        self.path.clone()
    }

    fn root(&self) -> ProviderResult<ConfigPath> {
        Ok(ConfigPath::parse(&self.path)?)
    }

    fn desired(&self) -> ProviderResult<Leaves> {
        let root = self.root()?;
        let mut leaves = Leaves::new();
        for (name, value) in &self.configs {
            leaves.insert(root.join(name.as_str())?, value.values());
        }
        Ok(leaves)
    }
}

/// A subtree under one node (`vyos_config_block_tree`).
///
/// Keys of `configs` are sub-paths with `.` between segments, e.g.
/// `"firewall.name"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigBlockTree {
    /// Space-separated path of the subtree root
    pub path: String,
    #[serde(default)]
    pub configs: BTreeMap<String, BlockValue>,
}

impl ConfigBlockTree {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            configs: BTreeMap::new(),
        }
    }

    /// Adds a leaf at a dot-separated sub-path.
    pub fn with(mut self, sub_path: impl Into<String>, value: impl Into<BlockValue>) -> Self {
        self.configs.insert(sub_path.into(), value.into());
        self
    }
}

impl Resource for ConfigBlockTree {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ConfigBlockTree
    }

    fn id(&self) -> String {
        self.path.clone()
    }

    fn root(&self) -> ProviderResult<ConfigPath> {
        Ok(ConfigPath::parse(&self.path)?)
    }

    fn desired(&self) -> ProviderResult<Leaves> {
        let root = self.root()?;
        let mut leaves = Leaves::new();
        for (sub_path, value) in &self.configs {
            let relative = ConfigPath::parse_with(sub_path, '.')?;
            leaves.insert(root.extend(&relative), value.values());
        }
        Ok(leaves)
    }
}
