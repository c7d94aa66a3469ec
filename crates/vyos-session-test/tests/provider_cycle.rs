//! Provider apply cycle integration tests
//!
//! Drives `vyos-provider` end to end against the in-memory device: plan
//! file, concurrent resources, single save.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use vyos_provider::{ApplyPlan, Provider, ProviderConfig, ProviderError};
use vyos_session::{SaveOutcome, SaveTarget};
use vyos_session_test::{
    assert_absent, assert_persisted, assert_running_value, assert_save_count, assert_serialized,
    MemoryDevice,
};

const PLAN: &str = r#"
[[config]]
key = "system host-name"
value = "edge-1"

[[config_block]]
path = "service ssh"
configs = { port = "2222", disable-host-validation = "" }

[[config_block_tree]]
path = "interfaces ethernet eth1"
configs = { "description" = "lan", "address" = ["192.0.2.1/24", "2001:db8::1/64"], "ip.arp-cache-timeout" = "60" }

[[static_host_mapping]]
host = "nas"
ip = "192.0.2.10"

[[static_host_mapping]]
host = "backup"
ip = "192.0.2.11"
"#;

fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn provider(config: ProviderConfig, device: &Arc<MemoryDevice>) -> Provider<Arc<MemoryDevice>> {
    let device = Arc::clone(device);
    Provider::configure_with(config, move |_| Ok(device)).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_apply_plan_file() {
    let device = Arc::new(
        MemoryDevice::new()
            .with_latency(Duration::from_millis(1))
            .with_running(vyos_session::config_entries! {
                set "service ssh port" => "22",
                set "service ssh ciphers" => "aes128-ctr",
            }),
    );
    let config_file = write_temp(
        "url = \"https://192.0.2.1\"\nkey = \"secret\"\nsave_file = \"/config/provider.cfg\"\n",
    );
    let config = ProviderConfig::load(config_file.path()).unwrap();
    let provider = provider(config, &device);

    let plan = ApplyPlan::load(write_temp(PLAN).path()).unwrap();
    let report = provider.apply(&plan).await.unwrap();

    assert!(report.is_success(), "failures: {:?}", report.failures().collect::<Vec<_>>());
    assert_eq!(
        report.save,
        Some(SaveOutcome::Saved(SaveTarget::File("/config/provider.cfg".to_string())))
    );
    assert_serialized(&device).unwrap();
    assert_save_count(&device, 1).unwrap();
    assert_persisted(&device, &SaveTarget::File("/config/provider.cfg".to_string())).unwrap();

    assert_running_value(&device, "system host-name", &["edge-1"]).unwrap();
    assert_running_value(&device, "service ssh port", &["2222"]).unwrap();
    assert_absent(&device, "service ssh ciphers").unwrap();
    assert_running_value(
        &device,
        "interfaces ethernet eth1 address",
        &["192.0.2.1/24", "2001:db8::1/64"],
    )
    .unwrap();
    assert_running_value(&device, "interfaces ethernet eth1 ip arp-cache-timeout", &["60"]).unwrap();
    assert_running_value(
        &device,
        "system static-host-mapping host-name backup inet",
        &["192.0.2.11"],
    )
    .unwrap();

    // Converged: a second cycle changes and saves nothing
    let report = provider.apply(&plan).await.unwrap();
    assert_eq!(report.applied(), 0);
    assert_eq!(report.save, Some(SaveOutcome::Clean));
    assert_save_count(&device, 1).unwrap();

    let report = provider.destroy(&plan).await.unwrap();
    assert!(report.is_success());
    assert_absent(&device, "system static-host-mapping").unwrap();
    assert_absent(&device, "interfaces ethernet eth1").unwrap();
    assert_save_count(&device, 2).unwrap();
}

#[test]
fn test_pinned_certificate_rejected_before_client_exists() {
    let config_file = write_temp(
        "url = \"https://192.0.2.1\"\nkey = \"secret\"\ncert = \"/etc/ssl/vyos.pem\"\n",
    );
    let config = ProviderConfig::load(config_file.path()).unwrap();
    let built = AtomicUsize::new(0);

    let result = Provider::configure_with(config, |_| {
        built.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryDevice::new())
    });

    assert!(matches!(
        result,
        Err(ProviderError::Configuration { field: "cert", .. })
    ));
    assert_eq!(built.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_two_providers_do_not_share_state() {
    let first = Arc::new(MemoryDevice::new());
    let second = Arc::new(MemoryDevice::new());
    let a = provider(ProviderConfig::new("https://192.0.2.1", "k"), &first);
    let b = provider(
        ProviderConfig::new("https://192.0.2.2", "k").with_save(false, None),
        &second,
    );

    let plan = ApplyPlan::load(write_temp(PLAN).path()).unwrap();
    a.apply(&plan).await.unwrap();
    b.apply(&plan).await.unwrap();

    assert!(!a.coordinator().is_dirty().await);
    assert!(b.coordinator().is_dirty().await);
    assert_save_count(&first, 1).unwrap();
    assert_save_count(&second, 0).unwrap();
}
