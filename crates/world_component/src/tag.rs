//! Component and system name tags.
//!
//! Components are schema-free at this layer — a component type is identified
//! by its name, and the store keeps its payloads as dynamically-typed values.
//! Systems are likewise identified by name; the schedule builder enforces
//! tag uniqueness across all phases.

use serde::{Deserialize, Serialize};

/// The name of a component type.
///
/// Used both as half of the component-table key and inside lock
/// declarations. Cheap to clone (a `String` today; interning can come later
/// if tag churn ever shows up in profiles).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentTag(pub String);

impl ComponentTag {
    /// Create a tag from any string-like value.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the tag name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ComponentTag {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ComponentTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The unique name of a system.
///
/// A system tag may appear at most once across all phases of a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SystemTag(pub String);

impl SystemTag {
    /// Create a tag from any string-like value.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the tag name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SystemTag {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for SystemTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_compare_by_name() {
        assert_eq!(ComponentTag::from("position"), ComponentTag::new("position"));
        assert_ne!(SystemTag::from("movement"), SystemTag::from("spawner"));
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(ComponentTag::from("hp").to_string(), "hp");
        assert_eq!(SystemTag::from("combat").to_string(), "combat");
    }
}
