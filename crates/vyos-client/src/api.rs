//! Request payloads and response envelope of the VyOS REST API.
//!
//! Every call is a form POST with two fields: `data`, a JSON command, and
//! `key`, the API key. The device answers with
//! `{"success": bool, "data": ..., "error": string|null}`.

use serde::Deserialize;
use serde_json::{json, Value};

use vyos_session::{ConfigEntry, ConfigPath, TransportError};

/// Endpoint for set/delete commands.
pub const CONFIGURE_ENDPOINT: &str = "configure";

/// Endpoint for save/load of configuration files.
pub const CONFIG_FILE_ENDPOINT: &str = "config-file";

/// Endpoint for read-only queries.
pub const RETRIEVE_ENDPOINT: &str = "retrieve";

/// Builds the `configure` command for one entry.
///
/// An empty value sets a valueless node (`set service ssh`), so it is sent
/// without a `value` field.
pub fn mutation_payload(entry: &ConfigEntry) -> Value {
    match &entry.value {
        Some(value) if value.is_empty() => json!({
            "op": "set",
            "path": entry.path.segments(),
        }),
        Some(value) => json!({
            "op": "set",
            "path": entry.path.segments(),
            "value": value,
        }),
        None => json!({
            "op": "delete",
            "path": entry.path.segments(),
        }),
    }
}

/// Builds the `config-file` save command.
pub fn save_payload(file: Option<&str>) -> Value {
    match file {
        Some(file) => json!({ "op": "save", "file": file }),
        None => json!({ "op": "save" }),
    }
}

/// Builds the `retrieve` command returning the subtree at `path`.
pub fn show_config_payload(path: &ConfigPath) -> Value {
    json!({
        "op": "showConfig",
        "path": path.segments(),
    })
}

/// Response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    /// Whether the command succeeded.
    pub success: bool,
    /// Command output.
    #[serde(default)]
    pub data: Option<Value>,
    /// Error text when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
}

/// Turns an HTTP status and body into the command result.
///
/// 401/403 are authentication failures. Otherwise the body must be a
/// response envelope; `success == false` is a device rejection.
pub fn interpret(status: u16, body: &str) -> Result<Option<Value>, TransportError> {
    if status == 401 || status == 403 {
        return Err(TransportError::authentication(first_line(body, status)));
    }

    let response: ApiResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) if (200..300).contains(&status) => {
            return Err(TransportError::decode(format!("invalid response body: {}", e)));
        }
        Err(_) => {
            return Err(TransportError::rejected(first_line(body, status)));
        }
    };

    if response.success {
        Ok(response.data)
    } else {
        let message = response
            .error
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| format!("request failed with HTTP {}", status));
        Err(TransportError::rejected(message))
    }
}

/// Returns true if a rejected `showConfig` only means the path is absent.
pub fn is_missing_path(error: &TransportError) -> bool {
    match error {
        TransportError::Rejected { message } => {
            let message = message.to_ascii_lowercase();
            message.contains("is empty") || message.contains("does not exist")
        }
        _ => false,
    }
}

fn first_line(body: &str, status: u16) -> String {
    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}
