//! Process-wide environment slot.
//!
//! An [`Environment`] is created once by the host and passed explicitly to
//! every orchestrator candidate. It owns:
//! - the active-orchestrator slot, settable exactly once
//! - the compatibility level generated units target
//!
//! The slot stores an identity record rather than a reference, so a
//! registration survives even if the orchestrator that made it is dropped
//! without cleaning up.

use std::fmt;
use std::sync::OnceLock;

use loadweave_types::CompatibilityLevel;
use uuid::Uuid;

use crate::config::TransformerConfig;

/// Unique identity of one orchestrator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrchestratorId(Uuid);

impl OrchestratorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrchestratorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrchestratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Record held in the environment slot for the registered orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveOrchestrator {
    pub id: OrchestratorId,
    pub name: String,
}

impl ActiveOrchestrator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: OrchestratorId::new(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ActiveOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// Registration point shared by all orchestrator candidates of one process.
#[derive(Debug)]
pub struct Environment {
    label: String,
    compatibility: CompatibilityLevel,
    active: OnceLock<ActiveOrchestrator>,
}

impl Environment {
    /// Create an environment targeting `compatibility` for generated units.
    pub fn new(compatibility: CompatibilityLevel) -> Self {
        Self {
            label: "default".to_string(),
            compatibility,
            active: OnceLock::new(),
        }
    }

    /// Build the environment described by `config`.
    pub fn from_config(config: &TransformerConfig) -> Self {
        Self::new(config.compatibility_level)
    }

    /// Label used in logs and errors.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn compatibility_level(&self) -> CompatibilityLevel {
        self.compatibility
    }

    /// The orchestrator currently registered, if any.
    pub fn active_orchestrator(&self) -> Option<&ActiveOrchestrator> {
        self.active.get()
    }

    /// Claim the slot for `candidate`.
    ///
    /// Exactly one caller ever succeeds, even under concurrent attempts. On
    /// failure the current holder is returned.
    pub fn set_active_orchestrator(
        &self,
        candidate: ActiveOrchestrator,
    ) -> Result<(), ActiveOrchestrator> {
        match self.active.set(candidate) {
            Ok(()) => Ok(()),
            Err(rejected) => Err(self.active.get().cloned().unwrap_or(rejected)),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(CompatibilityLevel::default())
    }
}
