//! Session coordinator scenarios against the in-memory device
//!
//! Each test drives the coordinator the way a resource adapter would and
//! checks both the returned result and what the device saw.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tokio_test::{assert_err, assert_ok};

use vyos_session::{
    config_entries, ConfigEntry, Coordinator, MutationError, SaveDirective, SaveOutcome,
    SaveTarget, SessionPhase, TransportError,
};
use vyos_session_test::{
    assert_persisted, assert_running_value, assert_save_count, fixtures::path, CallKind,
    MemoryDevice,
};

fn coordinator(device: MemoryDevice) -> (Coordinator<Arc<MemoryDevice>>, Arc<MemoryDevice>) {
    let device = Arc::new(device);
    (Coordinator::new(Arc::clone(&device)), device)
}

/// Scenario:
/// 1. Apply one address
/// 2. Session is dirty
/// 3. Save persists it and cleans the session
#[tokio::test]
async fn test_mutate_then_save() {
    let (coordinator, device) = coordinator(MemoryDevice::new());

    let report = assert_ok!(
        coordinator
            .mutate(config_entries! {
                set "interfaces ethernet eth0 address" => "10.0.0.1/24",
            })
            .await
    );
    assert_eq!(report.applied, 1);
    assert_eq!(coordinator.phase().await, SessionPhase::Dirty);

    let outcome = assert_ok!(coordinator.conditional_save(&SaveDirective::default()).await);
    assert_eq!(outcome, SaveOutcome::Saved(SaveTarget::Boot));
    assert_eq!(coordinator.phase().await, SessionPhase::Clean);

    assert_save_count(&device, 1).unwrap();
    assert_persisted(&device, &SaveTarget::Boot).unwrap();
}

/// Scenario:
/// 1. Submit two entries, the device rejects the second
/// 2. The error names the failed entry and one applied entry
/// 3. The session is dirty because the first entry landed
#[tokio::test]
async fn test_partial_batch_leaves_session_dirty() {
    let (coordinator, device) =
        coordinator(MemoryDevice::new().failing_on("interfaces ethernet eth0 mtu"));

    let err = assert_err!(
        coordinator
            .mutate(config_entries! {
                set "interfaces ethernet eth0 description" => "uplink",
                set "interfaces ethernet eth0 mtu" => "9000",
            })
            .await
    );

    assert_eq!(err.applied_count(), 1);
    assert_eq!(
        err.failed_entry(),
        Some(&ConfigEntry::set(path("interfaces ethernet eth0 mtu"), "9000"))
    );
    assert!(matches!(
        err,
        MutationError::Partial {
            cause: TransportError::Rejected { .. },
            ..
        }
    ));
    assert!(coordinator.is_dirty().await);
    assert_running_value(&device, "interfaces ethernet eth0 description", &["uplink"]).unwrap();
}

/// Scenario: saving to a named file on a clean session makes no device call.
#[tokio::test]
async fn test_save_on_clean_session_is_noop() {
    let (coordinator, device) = coordinator(MemoryDevice::new());

    let outcome = assert_ok!(
        coordinator
            .conditional_save(&SaveDirective::to_file("custom.cfg"))
            .await
    );

    assert_eq!(outcome, SaveOutcome::Clean);
    assert!(device.calls().is_empty());
}

/// Scenario: a failed save keeps the session dirty and the next save retries.
#[tokio::test]
async fn test_failed_save_keeps_session_dirty() {
    let (coordinator, device) = coordinator(MemoryDevice::new().with_failing_saves());

    assert_ok!(
        coordinator
            .mutate(config_entries! { set "system host-name" => "r1" })
            .await
    );
    let err = assert_err!(coordinator.conditional_save(&SaveDirective::default()).await);
    assert!(err.to_string().contains("divergent"));
    assert!(coordinator.is_dirty().await);

    assert_err!(coordinator.conditional_save(&SaveDirective::default()).await);
    assert_save_count(&device, 2).unwrap();
}

/// Scenario: with saving disabled the device never sees a save.
#[tokio::test]
async fn test_disabled_save_never_reaches_device() {
    let (coordinator, device) = coordinator(MemoryDevice::new());

    assert_ok!(
        coordinator
            .mutate(config_entries! { set "system host-name" => "r1" })
            .await
    );
    for _ in 0..3 {
        let outcome = assert_ok!(coordinator.conditional_save(&SaveDirective::disabled()).await);
        assert_eq!(outcome, SaveOutcome::Disabled);
    }

    assert_save_count(&device, 0).unwrap();
    assert!(coordinator.is_dirty().await);
}

/// Scenario: a delete submitted after an overlapping set runs first.
#[tokio::test]
async fn test_deletes_run_before_conflicting_sets() {
    let (coordinator, device) = coordinator(MemoryDevice::new().with_running(config_entries! {
        set "interfaces ethernet eth0 address" => "192.0.2.1/24",
    }));

    assert_ok!(
        coordinator
            .mutate(config_entries! {
                set "interfaces ethernet eth0 address" => "10.0.0.1/24",
                delete "interfaces ethernet eth0 address",
            })
            .await
    );

    assert_eq!(
        device.call_kinds(),
        vec![
            CallKind::Apply(ConfigEntry::delete(path("interfaces ethernet eth0 address"))),
            CallKind::Apply(ConfigEntry::set(
                path("interfaces ethernet eth0 address"),
                "10.0.0.1/24"
            )),
        ]
    );
    assert_running_value(&device, "interfaces ethernet eth0 address", &["10.0.0.1/24"]).unwrap();
}

/// Scenario: invalid batches are rejected before the device is contacted.
#[tokio::test]
async fn test_invalid_batches_never_reach_device() {
    let (coordinator, device) = coordinator(MemoryDevice::new());

    let err = assert_err!(coordinator.mutate(Vec::new()).await);
    assert_eq!(err, MutationError::EmptyBatch);

    let err = assert_err!(
        coordinator
            .mutate(config_entries! {
                set "system host-name" => "r1",
                set "system host-name" => "r1",
            })
            .await
    );
    assert!(matches!(err, MutationError::DuplicatePath { .. }));

    assert!(device.calls().is_empty());
    assert_eq!(coordinator.phase().await, SessionPhase::Clean);
}
