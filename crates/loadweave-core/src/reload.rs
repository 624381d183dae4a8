//! Hot-reload bookkeeping.
//!
//! [`ReloadIndex`] remembers, per donor, which targets were successfully
//! transformed using it. When a donor changes, [`ReloadCoordinator::reload`]
//! returns exactly those targets, in the order they were first transformed,
//! so the host can push them back through `transform`.
//!
//! Appends take one write lock for all donors of a unit, so concurrent
//! transforms never lose a target.

use std::collections::HashMap;

use indexmap::IndexSet;
use loadweave_types::ClassTree;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

/// Donor name → targets built from it, insertion ordered and duplicate free.
#[derive(Debug, Default)]
pub struct ReloadIndex {
    entries: RwLock<HashMap<String, IndexSet<String>>>,
}

impl ReloadIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `target` was produced using each of `donors`.
    ///
    /// A target already recorded for a donor keeps its original position.
    pub fn record(&self, target: &str, donors: &[String]) {
        if donors.is_empty() {
            return;
        }
        let mut entries = self.entries.write();
        for donor in donors {
            let targets = entries.entry(donor.clone()).or_default();
            if targets.insert(target.to_string()) {
                debug!(donor = %donor, unit = target, "recorded reload dependency");
            }
        }
    }

    /// Targets recorded for `donor`, in first-transform order.
    pub fn targets(&self, donor: &str) -> Vec<String> {
        self.entries
            .read()
            .get(donor)
            .map(|targets| targets.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// All donors with at least one recorded target, sorted by name.
    pub fn donors(&self) -> Vec<String> {
        let mut donors: Vec<String> = self.entries.read().keys().cloned().collect();
        donors.sort();
        donors
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Latest donor definitions handed in through reload.
///
/// Collaborators read this through the weave context to pick up a refreshed
/// donor when its targets are re-submitted.
#[derive(Debug, Default)]
pub struct DonorStore {
    latest: RwLock<HashMap<String, ClassTree>>,
}

impl DonorStore {
    pub fn get(&self, donor: &str) -> Option<ClassTree> {
        self.latest.read().get(donor).cloned()
    }

    pub fn contains(&self, donor: &str) -> bool {
        self.latest.read().contains_key(donor)
    }

    fn replace(&self, donor: &str, tree: ClassTree) {
        self.latest.write().insert(donor.to_string(), tree);
    }
}

#[derive(Debug, Default)]
pub struct ReloadCoordinator {
    index: ReloadIndex,
    donors: DonorStore,
}

impl ReloadCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> &ReloadIndex {
        &self.index
    }

    pub fn donors(&self) -> &DonorStore {
        &self.donors
    }

    /// Record a successful transform of `target` that used `donors`.
    pub fn record(&self, target: &str, donors: &[String]) {
        self.index.record(target, donors);
    }

    /// Accept a new definition of `donor` and return the targets that must be
    /// retransformed. An unknown donor yields an empty list.
    pub fn reload(&self, donor: &str, tree: ClassTree) -> Vec<String> {
        if tree.name() != donor {
            warn!(
                donor,
                tree = tree.name(),
                "reloaded donor tree carries a different name"
            );
        }
        self.donors.replace(donor, tree);

        let targets = self.index.targets(donor);
        info!(donor, targets = targets.len(), "donor reloaded");
        targets
    }
}
