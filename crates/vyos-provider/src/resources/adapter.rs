use std::sync::Arc;

use tracing::{debug, info, instrument};

use vyos_session::tree::flatten;
use vyos_session::{ConfigEntry, ConfigPath, Coordinator, Leaves, SessionClient};

use super::Resource;
use crate::diff::{full_sets, plan_changes};
use crate::error::ProviderResult;

/// Result of a create, update or delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceChange {
    /// Entries the device applied; zero when already in the desired state
    pub applied: usize,
}

/// Runs resource lifecycle operations through a shared coordinator.
pub struct ResourceAdapter<C> {
    coordinator: Arc<Coordinator<C>>,
}

impl<C> Clone for ResourceAdapter<C> {
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
        }
    }
}

impl<C: SessionClient> ResourceAdapter<C> {
    pub fn new(coordinator: Arc<Coordinator<C>>) -> Self {
        Self { coordinator }
    }

    /// Makes the device subtree match `resource`.
    ///
    /// Leaves under the root that the resource does not declare are deleted.
    #[instrument(skip_all, fields(kind = %resource.kind(), id = %resource.id()))]
    pub async fn create(&self, resource: &dyn Resource) -> ProviderResult<ResourceChange> {
        let root = resource.root()?;
        let desired = resource.desired()?;
        let observed = self.observe(&root).await?;
        let changes = plan_changes(&observed, &desired);
        self.submit(changes).await
    }

    /// Returns the leaves currently on the device under the resource root,
    /// or `None` if the subtree is absent.
    #[instrument(skip_all, fields(kind = %resource.kind(), id = %resource.id()))]
    pub async fn read(&self, resource: &dyn Resource) -> ProviderResult<Option<Leaves>> {
        let root = resource.root()?;
        let observed = self.observe(&root).await?;
        Ok((!observed.is_empty()).then_some(observed))
    }

    /// Moves from `previous` to `next`.
    ///
    /// With an unchanged root this is a reconcile. Otherwise the previous
    /// subtree, if still present, is deleted and the next one set in full,
    /// in one batch.
    #[instrument(skip_all, fields(kind = %next.kind(), id = %next.id()))]
    pub async fn update(
        &self,
        previous: &dyn Resource,
        next: &dyn Resource,
    ) -> ProviderResult<ResourceChange> {
        let previous_root = previous.root()?;
        let next_root = next.root()?;
        if previous_root == next_root {
            return self.create(next).await;
        }

        debug!(from = %previous_root, to = %next_root, "Resource root changed");
        let mut changes = Vec::new();
        if self.observe(&previous_root).await?.is_empty() {
            debug!(root = %previous_root, "Previous root already absent");
        } else {
            changes.push(ConfigEntry::delete(previous_root));
        }
        changes.extend(full_sets(&next.desired()?));
        self.submit(changes).await
    }

    /// Deletes the resource subtree.
    #[instrument(skip_all, fields(kind = %resource.kind(), id = %resource.id()))]
    pub async fn delete(&self, resource: &dyn Resource) -> ProviderResult<ResourceChange> {
        let root = resource.root()?;
        if self.observe(&root).await?.is_empty() {
            debug!(root = %root, "Nothing to delete");
            return Ok(ResourceChange::default());
        }
        self.submit(vec![ConfigEntry::delete(root)]).await
    }

    async fn observe(&self, root: &ConfigPath) -> ProviderResult<Leaves> {
        let subtree = self.coordinator.read(root).await?;
        Ok(subtree
            .map(|value| flatten(root, &value))
            .unwrap_or_default())
    }

    async fn submit(&self, changes: Vec<ConfigEntry>) -> ProviderResult<ResourceChange> {
        if changes.is_empty() {
            debug!("Already in desired state");
            return Ok(ResourceChange::default());
        }
        let report = self.coordinator.mutate(changes).await?;
        info!(applied = report.applied, "Resource changes applied");
        Ok(ResourceChange {
            applied: report.applied,
        })
    }
}
