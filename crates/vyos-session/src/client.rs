//! Session client boundary.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::entry::{ConfigEntry, ConfigPath};
use crate::error::TransportResult;

/// Transport to one device configuration session.
///
/// Each call is atomic from the caller's point of view: an entry is either
/// applied or not. Implementations are NOT required to serialize concurrent
/// calls; the [`Coordinator`](crate::Coordinator) guarantees it never issues
/// overlapping calls on one client.
///
/// # Example
///
/// ```ignore
/// use vyos_session::{SessionClient, ConfigEntry, TransportResult};
///
/// struct Loopback;
///
/// #[async_trait]
/// impl SessionClient for Loopback {
///     fn endpoint(&self) -> &str { "loopback" }
///     async fn apply_mutation(&self, entry: &ConfigEntry) -> TransportResult<()> { Ok(()) }
///     async fn save(&self) -> TransportResult<()> { Ok(()) }
///     async fn save_as(&self, _file: &str) -> TransportResult<()> { Ok(()) }
///     async fn retrieve(&self, _path: &ConfigPath) -> TransportResult<Option<Value>> { Ok(None) }
/// }
/// ```
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Returns the device endpoint (for logging).
    fn endpoint(&self) -> &str;

    /// Applies one set or delete to the running configuration.
    async fn apply_mutation(&self, entry: &ConfigEntry) -> TransportResult<()>;

    /// Persists the running configuration to the boot configuration.
    async fn save(&self) -> TransportResult<()>;

    /// Persists the running configuration to the named file.
    async fn save_as(&self, file: &str) -> TransportResult<()>;

    /// Reads the subtree at `path`; `Ok(None)` if the path does not exist.
    async fn retrieve(&self, path: &ConfigPath) -> TransportResult<Option<Value>>;
}

#[async_trait]
impl<C: SessionClient + ?Sized> SessionClient for Arc<C> {
    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    async fn apply_mutation(&self, entry: &ConfigEntry) -> TransportResult<()> {
        (**self).apply_mutation(entry).await
    }

    async fn save(&self) -> TransportResult<()> {
        (**self).save().await
    }

    async fn save_as(&self, file: &str) -> TransportResult<()> {
        (**self).save_as(file).await
    }

    async fn retrieve(&self, path: &ConfigPath) -> TransportResult<Option<Value>> {
        (**self).retrieve(path).await
    }
}

#[async_trait]
impl<C: SessionClient + ?Sized> SessionClient for Box<C> {
    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    async fn apply_mutation(&self, entry: &ConfigEntry) -> TransportResult<()> {
        (**self).apply_mutation(entry).await
    }

    async fn save(&self) -> TransportResult<()> {
        (**self).save().await
    }

    async fn save_as(&self, file: &str) -> TransportResult<()> {
        (**self).save_as(file).await
    }

    async fn retrieve(&self, path: &ConfigPath) -> TransportResult<Option<Value>> {
        (**self).retrieve(path).await
    }
}
