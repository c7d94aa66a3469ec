//! Session coordinator - the single owner of the device session.
//!
//! # Ordering
//!
//! Every device call goes through one async mutex per coordinator, held for
//! the whole batch, save or read. Operations on one coordinator are
//! therefore totally ordered and their device-call windows never overlap.
//! Two coordinators (two provider instances) are independent.
//!
//! # State machine
//!
//! ```text
//!            mutate (>= 1 entry applied)
//!   Clean ───────────────────────────────▶ Dirty
//!     ▲                                      │ │
//!     └──────── conditional_save ok ─────────┘ │
//!                                              │
//!             conditional_save failed ◀────────┘ (stays Dirty)
//! ```
//!
//! A save on a clean session is a no-op and never reaches the device.
//! Nothing is retried here; callers own their retry policy.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::batch::prepare_batch;
use crate::client::SessionClient;
use crate::directive::{SaveDirective, SaveTarget};
use crate::entry::{ConfigEntry, ConfigPath};
use crate::error::{MutationError, SaveError, TransportError, TransportResult};

/// Observable state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No unsaved mutations since the last successful save.
    Clean,
    /// At least one mutation reached the device since the last successful save.
    Dirty,
}

/// Successful `mutate` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationReport {
    /// Number of entries applied, always the full batch length.
    pub applied: usize,
}

/// Successful `conditional_save` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Saving is disabled by the directive; the device was not contacted.
    Disabled,
    /// Nothing to persist; the device was not contacted.
    Clean,
    /// The running configuration was persisted to the target.
    Saved(SaveTarget),
}

/// Counters describing coordinator activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Batches that acquired the session.
    pub batches: u64,
    /// Entries the device accepted.
    pub entries_applied: u64,
    /// Batches that stopped early (failure or cancellation).
    pub batches_failed: u64,
    /// Successful saves.
    pub saves: u64,
    /// Failed saves.
    pub save_failures: u64,
    /// Saves skipped because the directive disabled them or the session was clean.
    pub saves_skipped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    batches: AtomicU64,
    entries_applied: AtomicU64,
    batches_failed: AtomicU64,
    saves: AtomicU64,
    save_failures: AtomicU64,
    saves_skipped: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    fn snapshot(&self) -> SessionStats {
        SessionStats {
            batches: self.batches.load(Ordering::Relaxed),
            entries_applied: self.entries_applied.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            saves: self.saves.load(Ordering::Relaxed),
            save_failures: self.save_failures.load(Ordering::Relaxed),
            saves_skipped: self.saves_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Session state guarded by the coordinator's mutex.
struct SessionState<C> {
    client: C,
    dirty: bool,
    last_save: Option<SaveTarget>,
}

/// Serializes all work against one device configuration session.
///
/// Created once per provider instance and shared with resource adapters
/// through an `Arc`.
///
/// # Example
///
/// ```ignore
/// let coordinator = Arc::new(Coordinator::new(client));
///
/// coordinator.mutate(config_entries! {
///     set "interfaces ethernet eth0 address" => "10.0.0.1/24",
/// }).await?;
///
/// coordinator.conditional_save(&SaveDirective::default()).await?;
/// ```
pub struct Coordinator<C> {
    endpoint: String,
    session: Mutex<SessionState<C>>,
    counters: Counters,
}

impl<C: SessionClient> Coordinator<C> {
    /// Creates a coordinator owning `client`, in the `Clean` state.
    pub fn new(client: C) -> Self {
        Self {
            endpoint: client.endpoint().to_string(),
            session: Mutex::new(SessionState {
                client,
                dirty: false,
                last_save: None,
            }),
            counters: Counters::default(),
        }
    }

    /// Returns the device endpoint of the underlying client.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Applies a batch of entries in order. See [`Self::mutate_with_cancel`].
    pub async fn mutate(&self, entries: Vec<ConfigEntry>) -> Result<MutationReport, MutationError> {
        self.mutate_with_cancel(entries, &CancellationToken::new())
            .await
    }

    /// Applies a batch of entries in order under exclusive session access.
    ///
    /// The batch is validated and, if a deletion overlaps an earlier set,
    /// re-ordered so deletions run first. Application stops at the first
    /// transport failure; already applied entries are not rolled back.
    ///
    /// Cancellation while waiting for the session returns
    /// [`MutationError::Cancelled`] with nothing applied. Cancellation during
    /// the batch lets the in-flight entry finish and reports the next entry
    /// as failed with [`TransportError::Cancelled`].
    ///
    /// The session becomes dirty as soon as one entry is applied.
    #[instrument(skip_all, fields(endpoint = %self.endpoint, entries = entries.len()))]
    pub async fn mutate_with_cancel(
        &self,
        entries: Vec<ConfigEntry>,
        cancel: &CancellationToken,
    ) -> Result<MutationReport, MutationError> {
        let batch = prepare_batch(entries)?;
        let total = batch.len();

        let mut session = self
            .acquire(cancel)
            .await
            .ok_or(MutationError::Cancelled)?;
        Counters::bump(&self.counters.batches, 1);

        let mut applied = 0usize;
        for entry in batch {
            if cancel.is_cancelled() {
                warn!(applied, total, entry = %entry, "Batch cancelled, skipping remaining entries");
                return Err(self.stop_batch(applied, entry, TransportError::Cancelled));
            }

            match session.client.apply_mutation(&entry).await {
                Ok(()) => {
                    debug!(entry = %entry, "Applied entry");
                    applied += 1;
                    session.dirty = true;
                    Counters::bump(&self.counters.entries_applied, 1);
                }
                Err(cause) => {
                    warn!(applied, total, entry = %entry, error = %cause, "Entry rejected, stopping batch");
                    return Err(self.stop_batch(applied, entry, cause));
                }
            }
        }

        info!(applied, "Mutation batch applied");
        Ok(MutationReport { applied })
    }

    fn stop_batch(&self, applied: usize, entry: ConfigEntry, cause: TransportError) -> MutationError {
        Counters::bump(&self.counters.batches_failed, 1);
        MutationError::Partial {
            applied_count: applied,
            failed_entry: entry,
            cause,
        }
    }

    /// Persists pending mutations. See [`Self::conditional_save_with_cancel`].
    pub async fn conditional_save(&self, directive: &SaveDirective) -> Result<SaveOutcome, SaveError> {
        self.conditional_save_with_cancel(directive, &CancellationToken::new())
            .await
    }

    /// Persists the running configuration if saving is enabled and the
    /// session is dirty.
    ///
    /// - `directive.save == false`: returns [`SaveOutcome::Disabled`] without
    ///   touching the session
    /// - clean session: returns [`SaveOutcome::Clean`] without a device call
    /// - dirty session: calls `save` or `save_as`; success clears the dirty
    ///   flag, failure leaves it set so a later call can retry
    #[instrument(skip_all, fields(endpoint = %self.endpoint, save = directive.save))]
    pub async fn conditional_save_with_cancel(
        &self,
        directive: &SaveDirective,
        cancel: &CancellationToken,
    ) -> Result<SaveOutcome, SaveError> {
        let Some(target) = directive.target() else {
            debug!("Saving disabled, leaving persistence to the operator");
            Counters::bump(&self.counters.saves_skipped, 1);
            return Ok(SaveOutcome::Disabled);
        };

        let mut session = self.acquire(cancel).await.ok_or(SaveError::Cancelled)?;

        if !session.dirty {
            debug!(target = %target, "Session clean, nothing to save");
            Counters::bump(&self.counters.saves_skipped, 1);
            return Ok(SaveOutcome::Clean);
        }

        let result = match &target {
            SaveTarget::Boot => session.client.save().await,
            SaveTarget::File(file) => session.client.save_as(file).await,
        };

        match result {
            Ok(()) => {
                session.dirty = false;
                session.last_save = Some(target.clone());
                Counters::bump(&self.counters.saves, 1);
                info!(target = %target, "Configuration saved");
                Ok(SaveOutcome::Saved(target))
            }
            Err(cause) => {
                Counters::bump(&self.counters.save_failures, 1);
                error!(
                    target = %target,
                    error = %cause,
                    "Save failed, running and saved configuration diverge"
                );
                Err(SaveError::Failed { target, cause })
            }
        }
    }

    /// Reads a subtree. See [`Self::read_with_cancel`].
    pub async fn read(&self, path: &ConfigPath) -> TransportResult<Option<Value>> {
        self.read_with_cancel(path, &CancellationToken::new()).await
    }

    /// Reads the subtree at `path` under exclusive session access, so a read
    /// never observes a half-applied batch.
    #[instrument(skip_all, fields(endpoint = %self.endpoint, path = %path))]
    pub async fn read_with_cancel(
        &self,
        path: &ConfigPath,
        cancel: &CancellationToken,
    ) -> TransportResult<Option<Value>> {
        let session = self
            .acquire(cancel)
            .await
            .ok_or(TransportError::Cancelled)?;
        let value = session.client.retrieve(path).await?;
        debug!(found = value.is_some(), "Retrieved subtree");
        Ok(value)
    }

    /// Returns the current session phase.
    pub async fn phase(&self) -> SessionPhase {
        if self.session.lock().await.dirty {
            SessionPhase::Dirty
        } else {
            SessionPhase::Clean
        }
    }

    /// Returns true if unsaved mutations exist.
    pub async fn is_dirty(&self) -> bool {
        self.phase().await == SessionPhase::Dirty
    }

    /// Returns where the last successful save went.
    pub async fn last_save(&self) -> Option<SaveTarget> {
        self.session.lock().await.last_save.clone()
    }

    /// Returns a snapshot of the activity counters.
    pub fn stats(&self) -> SessionStats {
        self.counters.snapshot()
    }

    async fn acquire(&self, cancel: &CancellationToken) -> Option<MutexGuard<'_, SessionState<C>>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Cancelled while waiting for the device session");
                None
            }
            guard = self.session.lock() => Some(guard),
        }
    }
}

impl<C> std::fmt::Debug for Coordinator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("endpoint", &self.endpoint)
            .field("stats", &self.counters.snapshot())
            .finish()
    }
}
