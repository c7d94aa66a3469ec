//! Helpers for configuration subtrees read back from the device.
//!
//! The device returns a subtree as JSON: containers are objects, leaves are
//! strings, multi-value leaves are arrays of strings and valueless nodes
//! (`disable`, `dhcp-options`) are empty objects.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::entry::ConfigPath;

/// Leaf values of a subtree keyed by full path.
///
/// A valueless node is recorded with a single empty string.
pub type Leaves = BTreeMap<ConfigPath, Vec<String>>;

/// Flattens the subtree `value` rooted at `base` into its leaves.
pub fn flatten(base: &ConfigPath, value: &Value) -> Leaves {
    let mut leaves = Leaves::new();
    collect(base.clone(), value, &mut leaves);
    leaves
}

fn collect(path: ConfigPath, value: &Value, leaves: &mut Leaves) {
    match value {
        Value::Object(children) if children.is_empty() => {
            leaves.entry(path).or_default().push(String::new());
        }
        Value::Object(children) => {
            for (name, child) in children {
                match path.join(name.as_str()) {
                    Ok(child_path) => collect(child_path, child, leaves),
                    Err(err) => {
                        warn!(node = %name, parent = %path, error = %err, "Skipping node with an invalid name");
                    }
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                if let Some(text) = scalar(item) {
                    leaves.entry(path.clone()).or_default().push(text);
                }
            }
        }
        other => {
            if let Some(text) = scalar(other) {
                leaves.entry(path).or_default().push(text);
            }
        }
    }
}

/// Returns the values of a leaf node, or `None` for containers.
pub fn leaf_values(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().filter_map(scalar).collect()),
        Value::Object(children) if children.is_empty() => Some(vec![String::new()]),
        Value::Object(_) => None,
        other => scalar(other).map(|text| vec![text]),
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
