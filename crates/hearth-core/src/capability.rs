//! Capability set and permission gate.
//!
//! Capabilities are resolved outside the workflow (by whatever authenticates
//! the actor) and handed in with every operation. The gate holds no state and
//! performs no I/O.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The set of named capabilities granted to an actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet(BTreeSet<String>);

impl CapabilitySet {
    /// Creates an empty capability set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma-separated capability list, ignoring blanks.
    #[must_use]
    pub fn parse_list(raw: &str) -> Self {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Returns `true` if the set contains `capability`.
    #[must_use]
    pub fn has(&self, capability: &str) -> bool {
        has(self, capability)
    }

    /// Returns `true` if no capabilities are granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the granted capabilities in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// The permission gate predicate.
#[must_use]
pub fn has(capabilities: &CapabilitySet, capability: &str) -> bool {
    capabilities.0.contains(capability)
}
