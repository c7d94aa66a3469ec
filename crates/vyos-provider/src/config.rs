//! Provider configuration
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! url = "https://192.0.2.1"
//! key = "secret"            # or VYOS_KEY in the environment
//! save = true
//! save_file = "/config/provider.boot"
//! timeout_secs = 600
//! ```
//!
//! [`ProviderConfig::validate`] runs before any client is built.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use vyos_client::{validate_url, HttpClientConfig, TlsPolicy};
use vyos_session::SaveDirective;

use crate::error::{ProviderError, ProviderResult};

/// Environment variable holding the API key when the file has none.
pub const KEY_ENV: &str = "VYOS_KEY";

/// Connection and save settings for one device.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Device base URL
    pub url: String,

    /// API key
    #[serde(default)]
    pub key: Option<String>,

    /// Trusted certificate; not supported, must be unset or empty
    #[serde(default)]
    pub cert: Option<String>,

    /// Persist the running configuration at the end of each apply cycle
    #[serde(default = "default_save")]
    pub save: bool,

    /// Save to this file instead of the boot configuration
    #[serde(default)]
    pub save_file: Option<String>,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_save() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    600
}

impl ProviderConfig {
    /// Creates a configuration with defaults for everything but URL and key.
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: Some(key.into()),
            cert: None,
            save: default_save(),
            save_file: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Loads a configuration file and fills the key from the environment.
    pub fn load(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ProviderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content).map_err(|message| ProviderError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        config.fill_key_from(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.message().to_string())
    }

    /// Fills a missing key from `lookup(KEY_ENV)`.
    pub fn fill_key_from(&mut self, lookup: impl FnOnce(&str) -> Option<String>) {
        if self.key.as_deref().map_or(true, str::is_empty) {
            if let Some(key) = lookup(KEY_ENV).filter(|k| !k.is_empty()) {
                self.key = Some(key);
            }
        }
    }

    /// Sets the save directive.
    pub fn with_save(mut self, save: bool, save_file: Option<String>) -> Self {
        self.save = save;
        self.save_file = save_file;
        self
    }

    /// Checks the configuration. Fails on missing URL or key and on any
    /// trusted certificate.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.url.trim().is_empty() {
            return Err(ProviderError::configuration("url", "must be set"));
        }
        validate_url(&self.url).map_err(|e| ProviderError::configuration("url", e.to_string()))?;

        if self.key.as_deref().map_or(true, str::is_empty) {
            return Err(ProviderError::configuration(
                "key",
                format!("must be set in the file or via {}", KEY_ENV),
            ));
        }

        if self.cert.as_deref().is_some_and(|c| !c.trim().is_empty()) {
            return Err(ProviderError::configuration(
                "cert",
                "trusted certificates are not supported, leave unset to accept the device certificate",
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ProviderError::configuration("timeout_secs", "must be > 0"));
        }

        Ok(())
    }

    /// Save directive for the apply cycle.
    pub fn save_directive(&self) -> SaveDirective {
        SaveDirective {
            save: self.save,
            file: self.save_file.clone().filter(|f| !f.is_empty()),
        }
    }

    /// Per-call timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Settings for the HTTP client.
    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig::new(self.url.clone(), self.key.clone().unwrap_or_default())
            .with_timeout(self.timeout())
            .with_tls(TlsPolicy::AcceptAny)
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("url", &self.url)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("cert", &self.cert)
            .field("save", &self.save)
            .field("save_file", &self.save_file)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
