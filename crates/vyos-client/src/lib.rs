//! HTTP transport for the VyOS REST API.
//!
//! Implements [`vyos_session::SessionClient`] on top of `reqwest`:
//!
//! - [`api`]: command payloads and response envelope
//! - [`HttpSessionClient`]: the client, one connection pool per provider
//! - [`error`]: construction errors
//!
//! | Session call | Endpoint | Command |
//! |--------------|----------|---------|
//! | `apply_mutation` | `/configure` | `set` / `delete` |
//! | `save` | `/config-file` | `save` |
//! | `save_as` | `/config-file` | `save` with `file` |
//! | `retrieve` | `/retrieve` | `showConfig` |
//!
//! # Example
//!
//! ```ignore
//! use vyos_client::{HttpClientConfig, HttpSessionClient};
//!
//! let client = HttpSessionClient::new(HttpClientConfig::new("https://192.0.2.1", key))?;
//! let coordinator = vyos_session::Coordinator::new(client);
//! ```

pub mod api;
pub mod error;
mod http;

pub use error::{ClientError, ClientResult};
pub use http::{validate_url, HttpClientConfig, HttpSessionClient, TlsPolicy, DEFAULT_TIMEOUT};
