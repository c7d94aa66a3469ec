//! Concurrency tests
//!
//! Many tasks share one coordinator on a multi-threaded runtime; the device
//! must still see one call at a time and each batch as one contiguous run.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::task::JoinSet;

use vyos_session::{
    ConfigPath, Coordinator, SaveDirective, SaveOutcome, SaveTarget, SessionPhase,
};
use vyos_session_test::{
    assert_batches_contiguous, assert_persisted, assert_save_count, assert_serialized,
    disjoint_batches, fixtures::path, MemoryDevice,
};

const TASKS: usize = 16;

/// Batch index from `interfaces ethernet eth<N> ...`
fn batch_of(path: &ConfigPath) -> Option<usize> {
    path.segments()
        .get(2)
        .and_then(|name| name.strip_prefix("eth"))
        .and_then(|n| n.parse().ok())
}

fn shared_coordinator(latency: Duration) -> (Arc<Coordinator<Arc<MemoryDevice>>>, Arc<MemoryDevice>) {
    let device = Arc::new(MemoryDevice::new().with_latency(latency));
    (Arc::new(Coordinator::new(Arc::clone(&device))), device)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_batches_are_serialized() {
    let (coordinator, device) = shared_coordinator(Duration::from_millis(2));

    let mut tasks = JoinSet::new();
    for batch in disjoint_batches(TASKS) {
        let coordinator = Arc::clone(&coordinator);
        tasks.spawn(async move { coordinator.mutate(batch).await });
    }
    while let Some(joined) = tasks.join_next().await {
        let report = joined.expect("task panicked").expect("batch failed");
        assert_eq!(report.applied, 3);
    }

    assert_serialized(&device).unwrap();
    assert_batches_contiguous(&device.calls(), batch_of).unwrap();
    assert_eq!(coordinator.stats().batches, TASKS as u64);
    assert_eq!(coordinator.stats().entries_applied, 3 * TASKS as u64);
    assert_eq!(coordinator.phase().await, SessionPhase::Dirty);

    for i in 0..TASKS {
        assert_eq!(
            device.running_value(&format!("interfaces ethernet eth{} description", i)),
            Some(vec![format!("link {}", i)])
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_mutations_reads_and_saves() {
    let (coordinator, device) = shared_coordinator(Duration::from_millis(1));

    let mut tasks = JoinSet::new();
    for (i, batch) in disjoint_batches(TASKS).into_iter().enumerate() {
        let coordinator = Arc::clone(&coordinator);
        tasks.spawn(async move {
            coordinator.mutate(batch).await.expect("batch failed");
            if i % 4 == 0 {
                coordinator
                    .read(&path(&format!("interfaces ethernet eth{}", i)))
                    .await
                    .expect("read failed")
                    .expect("subtree missing");
            }
            if i % 5 == 0 {
                coordinator
                    .conditional_save(&SaveDirective::default())
                    .await
                    .expect("save failed");
            }
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.expect("task panicked");
    }

    assert_serialized(&device).unwrap();
    assert_batches_contiguous(&device.calls(), batch_of).unwrap();

    // Final save persists whatever the intermediate saves missed
    let outcome = coordinator
        .conditional_save(&SaveDirective::default())
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        SaveOutcome::Saved(SaveTarget::Boot) | SaveOutcome::Clean
    ));
    assert_persisted(&device, &SaveTarget::Boot).unwrap();
    assert_eq!(coordinator.phase().await, SessionPhase::Clean);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_collapse_to_one_device_save() {
    let (coordinator, device) = shared_coordinator(Duration::from_millis(2));
    coordinator
        .mutate(vyos_session_test::system_fixtures::host_name("r1"))
        .await
        .unwrap();

    let mut tasks = JoinSet::new();
    for _ in 0..TASKS {
        let coordinator = Arc::clone(&coordinator);
        tasks.spawn(async move {
            coordinator
                .conditional_save(&SaveDirective::default())
                .await
                .expect("save failed")
        });
    }

    let mut saved = 0;
    while let Some(joined) = tasks.join_next().await {
        if let SaveOutcome::Saved(_) = joined.expect("task panicked") {
            saved += 1;
        }
    }

    assert_eq!(saved, 1);
    assert_save_count(&device, 1).unwrap();
    assert_serialized(&device).unwrap();
}
