//! Verification helpers for coordinator tests
//!
//! Checks recorded device calls for overlap and ordering, and compares
//! running and saved configuration.

use thiserror::Error;

use vyos_session::{ConfigPath, SaveTarget};

use crate::device::{CallKind, CallRecord, MemoryDevice};

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Device calls overlapped: {first:?} and {second:?}")]
    Overlap { first: CallKind, second: CallKind },

    #[error("Expected at most {expected} call(s) in flight, observed {actual}")]
    Concurrency { expected: usize, actual: usize },

    #[error("Expected path '{path}' not found in running configuration")]
    PathNotFound { path: String },

    #[error("Path '{path}' still present in running configuration")]
    PathPresent { path: String },

    #[error("Value mismatch for '{path}': expected {expected:?}, got {actual:?}")]
    ValueMismatch {
        path: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Nothing was saved to {target}")]
    NotSaved { target: SaveTarget },

    #[error("Saved configuration for {target} differs from running configuration")]
    SavedDiffers { target: SaveTarget },

    #[error("Expected {expected} save call(s), found {actual}")]
    SaveCountMismatch { expected: usize, actual: usize },

    #[error("Entries of one batch were interleaved with another batch")]
    Interleaved,
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Fails if any two recorded calls had overlapping time windows.
pub fn assert_no_overlap(calls: &[CallRecord]) -> VerifyResult<()> {
    let mut sorted: Vec<&CallRecord> = calls.iter().collect();
    sorted.sort_by_key(|c| c.started);

    for pair in sorted.windows(2) {
        if pair[1].started < pair[0].finished {
            return Err(VerificationError::Overlap {
                first: pair[0].kind.clone(),
                second: pair[1].kind.clone(),
            });
        }
    }
    Ok(())
}

/// Fails if more than one call was ever in flight on `device`.
pub fn assert_serialized(device: &MemoryDevice) -> VerifyResult<()> {
    let actual = device.max_in_flight();
    if actual > 1 {
        return Err(VerificationError::Concurrency {
            expected: 1,
            actual,
        });
    }
    assert_no_overlap(&device.calls())
}

/// Fails unless each batch appears as one contiguous run of apply calls.
///
/// `batch_of` maps an applied path to its batch; calls it maps to `None`
/// are ignored.
pub fn assert_batches_contiguous(
    calls: &[CallRecord],
    batch_of: impl Fn(&ConfigPath) -> Option<usize>,
) -> VerifyResult<()> {
    let mut seen = Vec::new();
    for call in calls {
        let CallKind::Apply(entry) = &call.kind else {
            continue;
        };
        let Some(batch) = batch_of(&entry.path) else {
            continue;
        };
        match seen.last() {
            Some(last) if *last == batch => {}
            _ if seen.contains(&batch) => return Err(VerificationError::Interleaved),
            _ => seen.push(batch),
        }
    }
    Ok(())
}

/// Fails unless `path` holds exactly `expected` in the running configuration.
pub fn assert_running_value(device: &MemoryDevice, path: &str, expected: &[&str]) -> VerifyResult<()> {
    let actual = device
        .running_value(path)
        .ok_or_else(|| VerificationError::PathNotFound {
            path: path.to_string(),
        })?;
    let expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        return Err(VerificationError::ValueMismatch {
            path: path.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Fails if anything at or under `path` is in the running configuration.
pub fn assert_absent(device: &MemoryDevice, path: &str) -> VerifyResult<()> {
    let prefix = ConfigPath::parse(path).map_err(|_| VerificationError::PathNotFound {
        path: path.to_string(),
    })?;
    if device.running().keys().any(|p| prefix.is_prefix_of(p)) {
        return Err(VerificationError::PathPresent {
            path: path.to_string(),
        });
    }
    Ok(())
}

/// Fails unless the snapshot saved to `target` equals the running configuration.
pub fn assert_persisted(device: &MemoryDevice, target: &SaveTarget) -> VerifyResult<()> {
    let saved = device
        .saved(target)
        .ok_or_else(|| VerificationError::NotSaved {
            target: target.clone(),
        })?;
    if saved != device.running() {
        return Err(VerificationError::SavedDiffers {
            target: target.clone(),
        });
    }
    Ok(())
}

/// Fails unless exactly `expected` save calls were made.
pub fn assert_save_count(device: &MemoryDevice, expected: usize) -> VerifyResult<()> {
    let actual = device.save_count();
    if actual != expected {
        return Err(VerificationError::SaveCountMismatch { expected, actual });
    }
    Ok(())
}
