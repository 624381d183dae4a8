//! Registry of units manufactured by generation collaborators.
//!
//! Entries are written by the generation side and read by downstream tooling
//! (exporters, debuggers). The registry is append-only for the lifetime of
//! the orchestrator: a name can be registered once and is never replaced.
//!
//! Collaborators never write to the registry directly while a unit is in
//! flight. They stage entries through [`WeaveContext::register_synthetic`]
//! into a per-call [`PendingSynthetic`]; the orchestrator publishes the staged
//! entries only once the call has fully succeeded, and drops them otherwise.
//!
//! [`WeaveContext::register_synthetic`]: crate::services::WeaveContext::register_synthetic

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What a synthetic unit is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticKind {
    /// Carries arguments between a donor and its target.
    ArgumentCarrier,
    /// Nested helper unit copied out of a donor.
    Inner,
    /// Anything else, labelled by the generator.
    Other(String),
}

/// Generation descriptor for one synthetic unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticClassInfo {
    pub name: String,
    pub kind: SyntheticKind,
    /// Donor or generator the unit was derived from.
    pub source: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl SyntheticClassInfo {
    pub fn new(name: impl Into<String>, kind: SyntheticKind, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            source: source.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Default)]
pub struct SyntheticClassRegistry {
    entries: RwLock<IndexMap<String, SyntheticClassInfo>>,
}

impl SyntheticClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `info`. Returns `false` if the name is already registered; the
    /// existing entry is kept.
    pub fn register(&self, info: SyntheticClassInfo) -> bool {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(&info.name) {
            warn!(
                unit = %info.name,
                existing_source = %existing.source,
                rejected_source = %info.source,
                "synthetic unit already registered"
            );
            return false;
        }
        debug!(unit = %info.name, kind = ?info.kind, "synthetic unit registered");
        entries.insert(info.name.clone(), info);
        true
    }

    pub fn get(&self, name: &str) -> Option<SyntheticClassInfo> {
        self.entries.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// All entries in registration order.
    pub fn entries(&self) -> Vec<SyntheticClassInfo> {
        self.entries.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Synthetic units staged by one transform or generate call.
#[derive(Debug, Default)]
pub struct PendingSynthetic {
    entries: Mutex<Vec<SyntheticClassInfo>>,
}

impl PendingSynthetic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self, info: SyntheticClassInfo) {
        self.entries.lock().push(info);
    }

    /// Names staged so far, in staging order.
    pub fn names(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Move every staged entry into `registry`. Returns how many were new.
    pub(crate) fn commit(&self, registry: &SyntheticClassRegistry) -> usize {
        let staged = std::mem::take(&mut *self.entries.lock());
        staged
            .into_iter()
            .map(|info| registry.register(info))
            .filter(|added| *added)
            .count()
    }
}
