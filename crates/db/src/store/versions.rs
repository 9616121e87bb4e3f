//! Per-schema change counters.

use dashmap::DashMap;

/// Monotonically increasing change version per schema (and per fixed
/// collection such as the ledger).
///
/// Readers compare versions instead of subscribing to change events. The
/// store bumps them after each commit while still holding the writer lock.
#[derive(Debug, Default)]
pub struct SchemaVersions {
    versions: DashMap<String, u64>,
}

impl SchemaVersions {
    /// Creates an empty map; every schema starts at version 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current version of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> u64 {
        self.versions.get(name).map_or(0, |v| *v)
    }

    /// Increments the version of every name.
    pub fn bump<'a>(&self, names: impl IntoIterator<Item = &'a String>) {
        for name in names {
            *self.versions.entry(name.clone()).or_insert(0) += 1;
        }
    }
}
