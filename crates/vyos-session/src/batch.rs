//! Mutation batch validation and ordering.
//!
//! A batch is applied entry by entry, so a deletion queued after an
//! overlapping set would remove what the set just wrote, or leave the tree
//! in a transient invalid state. Such batches are re-ordered so deletions
//! run first:
//!
//! - No conflict: submission order is kept untouched
//! - Conflict: stable partition, all deletions then all sets
//! - Delete and set on the same path: legal (replace), ordered delete first
//! - The same entry twice: rejected (multi-value nodes may still receive
//!   several sets on one path with different values)

use std::collections::HashSet;

use tracing::debug;

use crate::entry::{ConfigEntry, ConfigPath, Operation};
use crate::error::MutationError;

/// Validates `entries` and returns them in application order.
pub fn prepare_batch(entries: Vec<ConfigEntry>) -> Result<Vec<ConfigEntry>, MutationError> {
    if entries.is_empty() {
        return Err(MutationError::EmptyBatch);
    }

    reject_duplicates(&entries)?;

    if !has_late_conflicting_delete(&entries) {
        return Ok(entries);
    }

    debug!(
        entries = entries.len(),
        "Re-ordering batch: deletions moved ahead of overlapping sets"
    );
    let (mut ordered, sets): (Vec<_>, Vec<_>) =
        entries.into_iter().partition(ConfigEntry::is_delete);
    ordered.extend(sets);
    Ok(ordered)
}

fn reject_duplicates(entries: &[ConfigEntry]) -> Result<(), MutationError> {
    let mut seen: HashSet<(Operation, &ConfigPath, Option<&str>)> =
        HashSet::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert((entry.operation(), &entry.path, entry.value.as_deref())) {
            return Err(MutationError::DuplicatePath {
                path: entry.path.to_string(),
                operation: entry.operation().as_str(),
            });
        }
    }
    Ok(())
}

/// Returns true if some deletion overlaps a set submitted before it.
fn has_late_conflicting_delete(entries: &[ConfigEntry]) -> bool {
    let mut sets_so_far: Vec<&ConfigPath> = Vec::new();
    for entry in entries {
        if entry.is_delete() {
            if sets_so_far.iter().any(|set| set.overlaps(&entry.path)) {
                return true;
            }
        } else {
            sets_so_far.push(&entry.path);
        }
    }
    false
}
