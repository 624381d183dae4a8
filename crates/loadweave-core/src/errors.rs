//! Error taxonomy for the orchestrator.
//!
//! Every error is scoped: a codec or weaving failure aborts the one unit being
//! loaded and never touches other units. `AlreadyActive` and `DuplicatePhase`
//! are the only construction-time errors. Declining to generate a unit is not an error at
//! all and is reported through [`Generation::Declined`](crate::services::Generation).

use thiserror::Error;

use crate::environment::ActiveOrchestrator;

/// Failure of the binary codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Input does not start with the unit header.
    #[error("missing unit header (expected {expected:02x?})")]
    BadMagic { expected: [u8; 4] },

    /// Payload could not be decoded or encoded.
    #[error("malformed unit: {reason}")]
    Malformed { reason: String },

    /// Decoded or supplied tree violates a structural rule.
    #[error("invalid unit: {reason}")]
    Invalid { reason: String },
}

/// Veto raised by a phase to stop the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct PhaseVeto {
    pub reason: String,
}

impl PhaseVeto {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Failure inside the weaving or generation step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeavingError {
    /// A phase refused to let the pipeline continue.
    #[error("phase '{phase}' vetoed: {veto}")]
    Vetoed { phase: String, veto: PhaseVeto },

    /// The tree handed back carries a different qualified name.
    #[error("unit identity changed from '{expected}' to '{found}'")]
    IdentityChanged { expected: String, found: String },

    /// The weaving or generation collaborator failed.
    #[error("{reason}")]
    Service { reason: String },
}

impl WeavingError {
    pub fn service(reason: impl Into<String>) -> Self {
        WeavingError::Service {
            reason: reason.into(),
        }
    }
}

/// Top-level error returned to the host.
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    /// Another orchestrator already owns the environment.
    #[error("environment '{environment}' already has an active orchestrator ({existing})")]
    AlreadyActive {
        environment: String,
        existing: ActiveOrchestrator,
    },

    /// Two phases share a name; the pipeline keeps names unique.
    #[error("phase '{name}' is already registered")]
    DuplicatePhase { name: String },

    #[error("failed to decode unit '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: CodecError,
    },

    #[error("failed to encode unit '{name}': {source}")]
    Encode {
        name: String,
        #[source]
        source: CodecError,
    },

    #[error("weaving failed for '{name}': {source}")]
    Weaving {
        name: String,
        #[source]
        source: WeavingError,
    },

    #[error("generation failed for '{name}': {source}")]
    Generation {
        name: String,
        #[source]
        source: WeavingError,
    },

    #[error("audit failed: {source}")]
    Audit {
        #[source]
        source: WeavingError,
    },
}

impl TransformError {
    /// Name of the unit the error is scoped to, if any.
    pub fn unit_name(&self) -> Option<&str> {
        match self {
            TransformError::Decode { name, .. }
            | TransformError::Encode { name, .. }
            | TransformError::Weaving { name, .. }
            | TransformError::Generation { name, .. } => Some(name),
            TransformError::AlreadyActive { .. }
            | TransformError::DuplicatePhase { .. }
            | TransformError::Audit { .. } => None,
        }
    }

    /// Whether the error was raised by a phase veto.
    pub fn is_veto(&self) -> bool {
        matches!(
            self,
            TransformError::Weaving {
                source: WeavingError::Vetoed { .. },
                ..
            } | TransformError::Generation {
                source: WeavingError::Vetoed { .. },
                ..
            }
        )
    }
}
