//! Save policy applied at the end of an apply cycle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether and where to persist the running configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDirective {
    /// Persist at all. `false` leaves persistence to the operator.
    #[serde(default = "default_save")]
    pub save: bool,

    /// Named target file; `None` saves to the boot configuration.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_save() -> bool {
    true
}

impl Default for SaveDirective {
    fn default() -> Self {
        Self {
            save: default_save(),
            file: None,
        }
    }
}

impl SaveDirective {
    /// A directive that never contacts the device.
    pub fn disabled() -> Self {
        Self {
            save: false,
            file: None,
        }
    }

    /// A directive saving to the named file.
    pub fn to_file(file: impl Into<String>) -> Self {
        Self {
            save: true,
            file: Some(file.into()),
        }
    }

    /// Returns where a save would go, or `None` when saving is disabled.
    ///
    /// An empty file name is treated as unset.
    pub fn target(&self) -> Option<SaveTarget> {
        if !self.save {
            return None;
        }
        match self.file.as_deref() {
            Some(file) if !file.is_empty() => Some(SaveTarget::File(file.to_string())),
            _ => Some(SaveTarget::Boot),
        }
    }
}

/// Destination of a save.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaveTarget {
    /// The device's default boot configuration.
    Boot,
    /// A named configuration file.
    File(String),
}

impl fmt::Display for SaveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveTarget::Boot => f.write_str("boot configuration"),
            SaveTarget::File(file) => write!(f, "file '{}'", file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_saves_to_boot() {
        let directive = SaveDirective::default();
        assert!(directive.save);
        assert_eq!(directive.target(), Some(SaveTarget::Boot));
    }

    #[test]
    fn test_disabled_has_no_target() {
        assert_eq!(SaveDirective::disabled().target(), None);
        let directive = SaveDirective {
            save: false,
            file: Some("custom.cfg".to_string()),
        };
        assert_eq!(directive.target(), None);
    }

    #[test]
    fn test_file_target() {
        assert_eq!(
            SaveDirective::to_file("custom.cfg").target(),
            Some(SaveTarget::File("custom.cfg".to_string()))
        );
        assert_eq!(SaveDirective::to_file("").target(), Some(SaveTarget::Boot));
    }

    #[test]
    fn test_deserialize_defaults() {
        let directive: SaveDirective = serde_json::from_str("{}").unwrap();
        assert_eq!(directive, SaveDirective::default());
    }
}
