//! In-memory device implementing [`SessionClient`].
//!
//! `MemoryDevice` keeps a running configuration and one saved snapshot per
//! save target, applies set/delete the way the device does, and records
//! every call with its start and end instant so tests can check that no two
//! device calls overlapped.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::trace;

use vyos_session::{
    ConfigEntry, ConfigPath, Leaves, SaveTarget, SessionClient, TransportError, TransportResult,
};

/// Leaf names that accept several values.
pub const DEFAULT_MULTI_VALUE_LEAVES: &[&str] = &["address", "alias", "name-server"];

/// What a recorded call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallKind {
    /// `apply_mutation`
    Apply(ConfigEntry),
    /// `save`
    Save,
    /// `save_as`
    SaveAs(String),
    /// `retrieve`
    Retrieve(ConfigPath),
}

impl CallKind {
    /// Returns true for `save` and `save_as`.
    pub fn is_save(&self) -> bool {
        matches!(self, CallKind::Save | CallKind::SaveAs(_))
    }
}

/// One device call with its time window.
#[derive(Debug, Clone)]
pub struct CallRecord {
    /// The call.
    pub kind: CallKind,
    /// When the call entered the device.
    pub started: Instant,
    /// When the call returned.
    pub finished: Instant,
    /// Whether the call succeeded.
    pub succeeded: bool,
}

#[derive(Debug, Default)]
struct DeviceState {
    running: Leaves,
    saved: HashMap<SaveTarget, Leaves>,
    calls: Vec<CallRecord>,
}

/// In-memory stand-in for a VyOS device.
#[derive(Debug)]
pub struct MemoryDevice {
    endpoint: String,
    latency: Duration,
    fail_paths: HashSet<ConfigPath>,
    fail_saves: bool,
    multi_value: HashSet<String>,
    state: Mutex<DeviceState>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for MemoryDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDevice {
    /// Creates an empty device with no latency.
    pub fn new() -> Self {
        Self {
            endpoint: "memory://vyos".to_string(),
            latency: Duration::ZERO,
            fail_paths: HashSet::new(),
            fail_saves: false,
            multi_value: DEFAULT_MULTI_VALUE_LEAVES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            state: Mutex::new(DeviceState::default()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Sets the endpoint reported to the coordinator.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Makes every call take at least `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Rejects any mutation of `path`.
    pub fn failing_on(mut self, path: &str) -> Self {
        self.fail_paths
            .insert(ConfigPath::parse(path).expect("invalid fixture path"));
        self
    }

    /// Makes every save fail with a network error.
    pub fn with_failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    /// Seeds the running configuration.
    pub fn with_running<I>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = ConfigEntry>,
    {
        {
            let mut state = self.state.lock();
            for entry in entries {
                apply(&mut state.running, &self.multi_value, &entry)
                    .expect("invalid seed entry");
            }
        }
        self
    }

    /// Returns a copy of the running configuration.
    pub fn running(&self) -> Leaves {
        self.state.lock().running.clone()
    }

    /// Returns the values at `path` in the running configuration.
    pub fn running_value(&self, path: &str) -> Option<Vec<String>> {
        let path = ConfigPath::parse(path).ok()?;
        self.state.lock().running.get(&path).cloned()
    }

    /// Returns the snapshot last saved to `target`.
    pub fn saved(&self, target: &SaveTarget) -> Option<Leaves> {
        self.state.lock().saved.get(target).cloned()
    }

    /// Returns all recorded calls in completion order.
    pub fn calls(&self) -> Vec<CallRecord> {
        self.state.lock().calls.clone()
    }

    /// Returns recorded calls without timing, for order assertions.
    pub fn call_kinds(&self) -> Vec<CallKind> {
        self.state.lock().calls.iter().map(|c| c.kind.clone()).collect()
    }

    /// Returns how many save calls were made.
    pub fn save_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.kind.is_save())
            .count()
    }

    /// Returns the highest number of calls that were in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Tracks one call: waits for the configured latency, runs `op` on the
    /// state and records the call window.
    async fn call<T: Send>(
        &self,
        kind: CallKind,
        op: impl FnOnce(&mut DeviceState) -> TransportResult<T> + Send,
    ) -> TransportResult<T> {
        let started = Instant::now();
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut state = self.state.lock();
        let result = op(&mut state);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        trace!(call = ?kind, ok = result.is_ok(), "Memory device call");
        state.calls.push(CallRecord {
            kind,
            started,
            finished: Instant::now(),
            succeeded: result.is_ok(),
        });
        result
    }

    fn save_to(&self, state: &mut DeviceState, target: SaveTarget) -> TransportResult<()> {
        if self.fail_saves {
            return Err(TransportError::network("device unreachable during save"));
        }
        let snapshot = state.running.clone();
        state.saved.insert(target, snapshot);
        Ok(())
    }
}

#[async_trait]
impl SessionClient for MemoryDevice {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn apply_mutation(&self, entry: &ConfigEntry) -> TransportResult<()> {
        let failing = self.fail_paths.contains(&entry.path);
        self.call(CallKind::Apply(entry.clone()), |state| {
            if failing {
                return Err(TransportError::rejected(format!(
                    "Configuration path: [{}] is not valid",
                    entry.path
                )));
            }
            apply(&mut state.running, &self.multi_value, entry)
        })
        .await
    }

    async fn save(&self) -> TransportResult<()> {
        self.call(CallKind::Save, |state| self.save_to(state, SaveTarget::Boot))
            .await
    }

    async fn save_as(&self, file: &str) -> TransportResult<()> {
        let target = SaveTarget::File(file.to_string());
        self.call(CallKind::SaveAs(file.to_string()), |state| {
            self.save_to(state, target)
        })
        .await
    }

    async fn retrieve(&self, path: &ConfigPath) -> TransportResult<Option<Value>> {
        self.call(CallKind::Retrieve(path.clone()), |state| {
            Ok(subtree(&state.running, path))
        })
        .await
    }
}

/// Applies one entry to a leaf map the way the device does.
///
/// Deleting a node that does not exist is rejected.
fn apply(
    running: &mut Leaves,
    multi_value: &HashSet<String>,
    entry: &ConfigEntry,
) -> TransportResult<()> {
    match &entry.value {
        None => {
            if !running.keys().any(|path| entry.path.is_prefix_of(path)) {
                return Err(TransportError::rejected(format!(
                    "Nothing to delete (the specified node [{}] does not exist)",
                    entry.path
                )));
            }
            running.retain(|path, _| !entry.path.is_prefix_of(path));
        }
        Some(value) => {
            // A valueless set on an existing container is a no-op.
            if value.is_empty()
                && running
                    .keys()
                    .any(|p| entry.path.is_prefix_of(p) && p != &entry.path)
            {
                return Ok(());
            }
            // Valueless markers on ancestors become containers.
            running.retain(|path, values| {
                !(path != &entry.path
                    && path.is_prefix_of(&entry.path)
                    && values.iter().all(String::is_empty))
            });

            let multi = entry
                .path
                .last()
                .map(|leaf| multi_value.contains(leaf))
                .unwrap_or(false);
            let values = running.entry(entry.path.clone()).or_default();
            if multi {
                if !values.contains(value) {
                    values.push(value.clone());
                }
            } else {
                *values = vec![value.clone()];
            }
        }
    }
    Ok(())
}

/// Builds the JSON subtree at `path`, as `showConfig` returns it.
pub fn subtree(running: &Leaves, path: &ConfigPath) -> Option<Value> {
    if let Some(values) = running.get(path) {
        return Some(leaf_json(values));
    }

    let mut root = Map::new();
    for (leaf_path, values) in running {
        let Some(relative) = leaf_path.strip_prefix(path) else {
            continue;
        };
        insert(&mut root, relative.segments(), leaf_json(values));
    }

    if root.is_empty() {
        None
    } else {
        Some(Value::Object(root))
    }
}

fn insert(node: &mut Map<String, Value>, segments: &[String], leaf: Value) {
    match segments {
        [] => {}
        [last] => {
            node.insert(last.clone(), leaf);
        }
        [first, rest @ ..] => {
            let child = node
                .entry(first.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                insert(map, rest, leaf);
            }
        }
    }
}

fn leaf_json(values: &[String]) -> Value {
    match values {
        [only] if only.is_empty() => Value::Object(Map::new()),
        [only] => Value::String(only.clone()),
        many => Value::Array(many.iter().cloned().map(Value::String).collect()),
    }
}
