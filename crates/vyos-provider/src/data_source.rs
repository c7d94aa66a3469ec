//! Read-only lookup of one configuration path (data source `vyos_config`).

use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use vyos_session::tree::leaf_values;
use vyos_session::{ConfigPath, Coordinator, SessionClient};

use crate::error::ProviderResult;

/// What the device holds at a path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigValue {
    pub key: String,
    /// Leaf values; empty for containers and absent paths
    pub values: Vec<String>,
    /// Raw subtree as returned by the device
    pub tree: Option<Value>,
}

impl ConfigValue {
    /// First leaf value, the common single-value case.
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Returns true if the path exists on the device.
    pub fn exists(&self) -> bool {
        self.tree.is_some()
    }
}

/// Data source reading one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDataSource {
    pub key: String,
}

impl ConfigDataSource {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Reads the key through the coordinator.
    #[instrument(skip_all, fields(key = %self.key))]
    pub async fn read<C: SessionClient>(
        &self,
        coordinator: &Coordinator<C>,
    ) -> ProviderResult<ConfigValue> {
        let path = ConfigPath::parse(&self.key)?;
        let tree = coordinator.read(&path).await?;
        let values = tree.as_ref().and_then(leaf_values).unwrap_or_default();
        Ok(ConfigValue {
            key: self.key.clone(),
            values,
            tree,
        })
    }
}
