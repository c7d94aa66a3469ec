//! Provider instance and the apply cycle.
//!
//! One [`Provider`] owns one [`Coordinator`]. An apply cycle runs every
//! resource of a plan concurrently, then saves once if every resource
//! succeeded. A failed resource leaves the session dirty and skips the save;
//! the next cycle saves whatever is still pending.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use vyos_client::HttpSessionClient;
use vyos_session::{Coordinator, SaveDirective, SaveOutcome, SessionClient};

use crate::config::ProviderConfig;
use crate::data_source::{ConfigDataSource, ConfigValue};
use crate::error::{ProviderError, ProviderResult};
use crate::plan::ApplyPlan;
use crate::resources::{Resource, ResourceAdapter, ResourceChange, ResourceKind};

/// Outcome of one resource in a cycle.
#[derive(Debug)]
pub struct ResourceOutcome {
    pub kind: ResourceKind,
    pub id: String,
    pub result: ProviderResult<ResourceChange>,
}

/// Result of an apply or destroy cycle.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Per-resource outcomes in plan order
    pub outcomes: Vec<ResourceOutcome>,
    /// Save result; `None` when skipped because a resource failed
    pub save: Option<SaveOutcome>,
}

impl ApplyReport {
    /// Returns true if every resource succeeded.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Failed resources
    pub fn failures(&self) -> impl Iterator<Item = &ResourceOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// Total entries applied across resources
    pub fn applied(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|c| c.applied)
            .sum()
    }
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Apply,
    Destroy,
}

/// A configured provider bound to one device.
pub struct Provider<C> {
    config: ProviderConfig,
    coordinator: Arc<Coordinator<C>>,
    directive: SaveDirective,
}

impl Provider<HttpSessionClient> {
    /// Validates `config` and builds the HTTP client.
    pub fn configure(config: ProviderConfig) -> ProviderResult<Self> {
        Self::configure_with(config, |config| {
            Ok(HttpSessionClient::new(config.http_client_config())?)
        })
    }
}

impl<C: SessionClient + 'static> Provider<C> {
    /// Validates `config`, then builds the client with `factory`.
    ///
    /// An invalid configuration fails before `factory` runs, so no client or
    /// coordinator exists for it.
    pub fn configure_with<F>(config: ProviderConfig, factory: F) -> ProviderResult<Self>
    where
        F: FnOnce(&ProviderConfig) -> ProviderResult<C>,
    {
        config.validate()?;
        let client = factory(&config)?;
        let directive = config.save_directive();

        info!(
            endpoint = client.endpoint(),
            save = ?directive.target(),
            "Provider configured"
        );

        Ok(Self {
            config,
            coordinator: Arc::new(Coordinator::new(client)),
            directive,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Shared session coordinator
    pub fn coordinator(&self) -> &Arc<Coordinator<C>> {
        &self.coordinator
    }

    pub fn save_directive(&self) -> &SaveDirective {
        &self.directive
    }

    /// Returns an adapter bound to this provider's coordinator.
    pub fn adapter(&self) -> ResourceAdapter<C> {
        ResourceAdapter::new(Arc::clone(&self.coordinator))
    }

    /// Creates or reconciles every resource in `plan`, then saves once.
    pub async fn apply(&self, plan: &ApplyPlan) -> ProviderResult<ApplyReport> {
        self.run_cycle(plan, Action::Apply).await
    }

    /// Deletes every resource in `plan`, then saves once.
    pub async fn destroy(&self, plan: &ApplyPlan) -> ProviderResult<ApplyReport> {
        self.run_cycle(plan, Action::Destroy).await
    }

    /// Reads one key (data source).
    pub async fn read(&self, key: &str) -> ProviderResult<ConfigValue> {
        ConfigDataSource::new(key).read(&self.coordinator).await
    }

    /// Runs the conditional save on its own, e.g. after a failed cycle.
    pub async fn save(&self) -> ProviderResult<SaveOutcome> {
        Ok(self.coordinator.conditional_save(&self.directive).await?)
    }

    #[instrument(skip_all, fields(action = ?action, endpoint = %self.coordinator.endpoint(), resources = plan.len()))]
    async fn run_cycle(&self, plan: &ApplyPlan, action: Action) -> ProviderResult<ApplyReport> {
        plan.validate()?;

        let mut tasks = JoinSet::new();
        for (index, resource) in plan.resources().into_iter().enumerate() {
            let adapter = self.adapter();
            tasks.spawn(async move {
                let result = match action {
                    Action::Apply => adapter.create(resource.as_ref()).await,
                    Action::Destroy => adapter.delete(resource.as_ref()).await,
                };
                (index, outcome(resource.as_ref(), result))
            });
        }

        let mut outcomes = Vec::with_capacity(plan.len());
        let mut task_failure = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(indexed) => outcomes.push(indexed),
                Err(e) => {
                    error!(error = %e, "Resource task failed");
                    task_failure.get_or_insert_with(|| e.to_string());
                }
            }
        }
        if let Some(message) = task_failure {
            return Err(ProviderError::Task(message));
        }
        outcomes.sort_by_key(|(index, _)| *index);

        let mut report = ApplyReport {
            outcomes: outcomes.into_iter().map(|(_, o)| o).collect(),
            save: None,
        };

        if !report.is_success() {
            for failure in report.failures() {
                if let Err(e) = &failure.result {
                    warn!(kind = %failure.kind, id = %failure.id, error = %e, "Resource failed");
                }
            }
            warn!(
                failed = report.failures().count(),
                "Skipping save, unsaved changes stay pending"
            );
            return Ok(report);
        }

        report.save = Some(self.coordinator.conditional_save(&self.directive).await?);
        info!(applied = report.applied(), save = ?report.save, "Cycle complete");
        Ok(report)
    }
}

fn outcome(resource: &dyn Resource, result: ProviderResult<ResourceChange>) -> ResourceOutcome {
    ResourceOutcome {
        kind: resource.kind(),
        id: resource.id(),
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{ConfigBlock, ConfigResource, StaticHostMapping};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};
    use vyos_session::{SaveTarget, SessionPhase};
    use vyos_session_test::{assert_persisted, assert_save_count, MemoryDevice};

    fn config() -> ProviderConfig {
        ProviderConfig::new("https://192.0.2.1", "key")
    }

    fn provider(config: ProviderConfig, device: MemoryDevice) -> Provider<Arc<MemoryDevice>> {
        let device = Arc::new(device);
        Provider::configure_with(config, move |_| Ok(device)).unwrap()
    }

    fn plan() -> ApplyPlan {
        ApplyPlan {
            config: vec![ConfigResource::new("system host-name", "r1")],
            config_block: vec![ConfigBlock::new("service ssh").with("port", "22")],
            static_host_mapping: vec![StaticHostMapping::new("nas", "192.0.2.10")],
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_config_never_builds_client() {
        let built = AtomicBool::new(false);
        let mut config = config();
        config.cert = Some("pinned".to_string());

        let result = Provider::configure_with(config, |_| {
            built.store(true, Ordering::SeqCst);
            Ok(MemoryDevice::new())
        });

        assert!(matches!(
            result,
            Err(ProviderError::Configuration { field: "cert", .. })
        ));
        assert!(!built.load(Ordering::SeqCst));
    }

    #[test]
    fn test_configure_http_client() {
        let provider = Provider::configure(config()).unwrap();
        assert_eq!(provider.coordinator().endpoint(), "https://192.0.2.1");
        assert_eq!(provider.save_directive(), &SaveDirective::default());
    }

    #[tokio::test]
    async fn test_apply_saves_once() {
        let device = Arc::new(MemoryDevice::new());
        let handle = Arc::clone(&device);
        let provider = Provider::configure_with(config(), move |_| Ok(device)).unwrap();

        let report = provider.apply(&plan()).await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.applied(), 3);
        assert_eq!(report.save, Some(SaveOutcome::Saved(SaveTarget::Boot)));
        assert_save_count(&handle, 1).unwrap();
        assert_persisted(&handle, &SaveTarget::Boot).unwrap();
        assert_eq!(provider.coordinator().phase().await, SessionPhase::Clean);

        // Second cycle: nothing to change, nothing to save
        let report = provider.apply(&plan()).await.unwrap();
        assert_eq!(report.applied(), 0);
        assert_eq!(report.save, Some(SaveOutcome::Clean));
        assert_save_count(&handle, 1).unwrap();
    }

    #[tokio::test]
    async fn test_failed_resource_skips_save() {
        let device = Arc::new(MemoryDevice::new().failing_on("system host-name"));
        let handle = Arc::clone(&device);
        let provider = Provider::configure_with(config(), move |_| Ok(device)).unwrap();

        let report = provider.apply(&plan()).await.unwrap();

        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.failures().next().unwrap().kind, ResourceKind::Config);
        assert_eq!(report.save, None);
        assert_save_count(&handle, 0).unwrap();
        assert!(provider.coordinator().is_dirty().await);

        assert_eq!(
            provider.save().await.unwrap(),
            SaveOutcome::Saved(SaveTarget::Boot)
        );
    }

    #[tokio::test]
    async fn test_save_disabled() {
        let device = Arc::new(MemoryDevice::new());
        let handle = Arc::clone(&device);
        let provider =
            Provider::configure_with(config().with_save(false, None), move |_| Ok(device)).unwrap();

        let report = provider.apply(&plan()).await.unwrap();

        assert_eq!(report.save, Some(SaveOutcome::Disabled));
        assert_save_count(&handle, 0).unwrap();
        assert!(provider.coordinator().is_dirty().await);
    }

    #[tokio::test]
    async fn test_failed_save_is_fatal() {
        let provider = provider(config(), MemoryDevice::new().with_failing_saves());

        let err = provider.apply(&plan()).await.unwrap_err();

        assert!(matches!(err, ProviderError::Save(_)));
        assert!(provider.coordinator().is_dirty().await);
    }

    #[tokio::test]
    async fn test_destroy_and_read() {
        let device = Arc::new(MemoryDevice::new());
        let provider = Provider::configure_with(
            config().with_save(true, Some("/config/provider.cfg".to_string())),
            move |_| Ok(device),
        )
        .unwrap();

        provider.apply(&plan()).await.unwrap();
        assert_eq!(provider.read("system host-name").await.unwrap().value(), Some("r1"));

        let report = provider.destroy(&plan()).await.unwrap();
        assert_eq!(report.applied(), 3);
        assert_eq!(
            report.save,
            Some(SaveOutcome::Saved(SaveTarget::File(
                "/config/provider.cfg".to_string()
            )))
        );
        assert!(!provider.read("system host-name").await.unwrap().exists());
    }
}
