//! Configuration paths and entries.
//!
//! A [`ConfigEntry`] is the unit of change submitted to the device session:
//! a path into the hierarchical configuration tree plus an optional value.
//! An entry without a value is a deletion of that path and everything
//! beneath it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PathError;

/// Path into the device configuration tree, one segment per level.
///
/// The textual form is the device CLI form: segments separated by single
/// spaces, e.g. `interfaces ethernet eth0 address`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigPath {
    segments: Vec<String>,
}

impl ConfigPath {
    /// Creates an empty path (the configuration root).
    pub fn root() -> Self {
        Self::default()
    }

    /// Builds a path from already split segments.
    ///
    /// Fails if any segment is empty or contains whitespace.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        for (index, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(PathError::EmptySegment { index });
            }
            if segment.chars().any(char::is_whitespace) {
                return Err(PathError::Whitespace {
                    segment: segment.clone(),
                });
            }
        }
        Ok(Self { segments })
    }

    /// Parses a space-separated key. Runs of whitespace count as one separator.
    pub fn parse(key: &str) -> Result<Self, PathError> {
        let segments: Vec<&str> = key.split_whitespace().collect();
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Self::from_segments(segments)
    }

    /// Parses a sub-path whose segments are separated by `separator`.
    pub fn parse_with(key: &str, separator: char) -> Result<Self, PathError> {
        if key.is_empty() {
            return Err(PathError::Empty);
        }
        Self::from_segments(key.split(separator))
    }

    /// Returns the segments of this path.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true for the root path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the last segment, if any.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns a new path with `segment` appended.
    pub fn join(&self, segment: impl Into<String>) -> Result<Self, PathError> {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self::from_segments(segments)
    }

    /// Returns a new path with all segments of `suffix` appended.
    pub fn extend(&self, suffix: &ConfigPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(suffix.segments.iter().cloned());
        Self { segments }
    }

    /// Returns the part of this path below `prefix`, if `prefix` is a prefix.
    pub fn strip_prefix(&self, prefix: &ConfigPath) -> Option<ConfigPath> {
        if prefix.is_prefix_of(self) {
            Some(Self {
                segments: self.segments[prefix.len()..].to_vec(),
            })
        } else {
            None
        }
    }

    /// Returns true if `self` equals `other` or is one of its ancestors.
    pub fn is_prefix_of(&self, other: &ConfigPath) -> bool {
        self.segments.len() <= other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|(a, b)| a == b)
    }

    /// Returns true if the two paths are equal or one contains the other.
    pub fn overlaps(&self, other: &ConfigPath) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join(" "))
    }
}

impl FromStr for ConfigPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Kind of change an entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Add or update the value at a path.
    Set,
    /// Remove a path and its subtree.
    Delete,
}

impl Operation {
    /// Returns the operation name used by the device API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Set => "set",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node change in the configuration tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// Location of the node.
    pub path: ConfigPath,
    /// New value; `None` deletes the node.
    pub value: Option<String>,
}

impl ConfigEntry {
    /// Creates a set entry.
    pub fn set(path: ConfigPath, value: impl Into<String>) -> Self {
        Self {
            path,
            value: Some(value.into()),
        }
    }

    /// Creates a delete entry.
    pub fn delete(path: ConfigPath) -> Self {
        Self { path, value: None }
    }

    /// Returns the operation this entry performs.
    pub fn operation(&self) -> Operation {
        if self.value.is_some() {
            Operation::Set
        } else {
            Operation::Delete
        }
    }

    /// Returns true for deletions.
    pub fn is_delete(&self) -> bool {
        self.value.is_none()
    }
}

impl fmt::Display for ConfigEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "set {} '{}'", self.path, value),
            None => write!(f, "delete {}", self.path),
        }
    }
}

/// Builds a `Vec<ConfigEntry>` from `set`/`delete` lines.
///
/// Panics on malformed paths, so it is meant for literals and tests.
#[macro_export]
macro_rules! config_entries {
    ($($op:ident $path:expr $(=> $value:expr)?),* $(,)?) => {
        vec![
            $($crate::config_entries!(@entry $op $path $(=> $value)?),)*
        ]
    };
    (@entry set $path:expr => $value:expr) => {
        $crate::ConfigEntry::set(
            $crate::ConfigPath::parse($path).expect("invalid config path"),
            $value,
        )
    };
    (@entry delete $path:expr) => {
        $crate::ConfigEntry::delete($crate::ConfigPath::parse($path).expect("invalid config path"))
    };
}
