//! Test fixtures for common configuration changes
//!
//! Each helper returns a ready-made batch for one subtree, so tests can run
//! several of them side by side without overlapping paths.

use vyos_session::{config_entries, ConfigEntry, ConfigPath};

/// Parses a path, panicking on invalid fixture input.
pub fn path(key: &str) -> ConfigPath {
    ConfigPath::parse(key).expect("invalid fixture path")
}

/// Interface fixtures
pub mod interface_fixtures {
    use super::*;

    /// Adds addresses to an ethernet interface.
    pub fn ethernet_addresses(name: &str, addresses: &[&str]) -> Vec<ConfigEntry> {
        let base = path(&format!("interfaces ethernet {} address", name));
        addresses
            .iter()
            .map(|address| ConfigEntry::set(base.clone(), *address))
            .collect()
    }

    /// Replaces the existing addresses of an ethernet interface.
    ///
    /// The device rejects the leading delete if the interface has none.
    pub fn replace_ethernet_addresses(name: &str, addresses: &[&str]) -> Vec<ConfigEntry> {
        let mut entries = vec![ConfigEntry::delete(path(&format!(
            "interfaces ethernet {} address",
            name
        )))];
        entries.extend(ethernet_addresses(name, addresses));
        entries
    }

    /// Sets the description of an ethernet interface.
    pub fn ethernet_description(name: &str, description: &str) -> Vec<ConfigEntry> {
        vec![ConfigEntry::set(
            path(&format!("interfaces ethernet {} description", name)),
            description,
        )]
    }
}

/// System fixtures
pub mod system_fixtures {
    use super::*;

    /// Sets the host name.
    pub fn host_name(name: &str) -> Vec<ConfigEntry> {
        vec![ConfigEntry::set(path("system host-name"), name)]
    }

    /// Adds a static host mapping.
    pub fn static_host(host: &str, address: &str) -> Vec<ConfigEntry> {
        vec![ConfigEntry::set(
            path(&format!("system static-host-mapping host-name {} inet", host)),
            address,
        )]
    }

    /// Sets DNS name servers.
    pub fn name_servers(servers: &[&str]) -> Vec<ConfigEntry> {
        servers
            .iter()
            .map(|server| ConfigEntry::set(path("system name-server"), *server))
            .collect()
    }
}

/// Service fixtures
pub mod service_fixtures {
    use super::*;

    /// Enables SSH on `port`.
    pub fn ssh(port: u16) -> Vec<ConfigEntry> {
        config_entries! {
            set "service ssh" => "",
            set "service ssh port" => port.to_string(),
        }
    }

    /// Enables NTP with the given servers.
    pub fn ntp(servers: &[&str]) -> Vec<ConfigEntry> {
        servers
            .iter()
            .map(|server| ConfigEntry::set(path(&format!("service ntp server {}", server)), ""))
            .collect()
    }
}

/// One batch per index, each touching its own subtree.
pub fn disjoint_batches(count: usize) -> Vec<Vec<ConfigEntry>> {
    (0..count)
        .map(|i| {
            let name = format!("eth{}", i);
            let mut batch = interface_fixtures::ethernet_addresses(
                &name,
                &[&format!("10.0.{}.1/24", i), &format!("2001:db8:{}::1/64", i)],
            );
            batch.extend(interface_fixtures::ethernet_description(
                &name,
                &format!("link {}", i),
            ));
            batch
        })
        .collect()
}
