//! Collaborator interfaces consumed by the orchestrator.
//!
//! The weaving and generation algorithms live outside this crate. The
//! orchestrator hands them a [`WeaveContext`] and an exclusively borrowed
//! [`ClassTree`]; whatever they do to the tree, and any synthetic unit they
//! register through the context, is only published if the whole call
//! succeeds.

use loadweave_types::ClassTree;

use crate::environment::Environment;
use crate::errors::WeavingError;
use crate::phases::ExtensionPipeline;
use crate::reload::DonorStore;
use crate::synthetic::{PendingSynthetic, SyntheticClassInfo};

/// Which entry point a unit is flowing through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaveMode {
    /// Existing bytes are being woven.
    Transform,
    /// A new unit is being synthesized from an empty stub.
    Generate,
}

/// What a collaborator sees while working on one unit.
#[derive(Clone, Copy)]
pub struct WeaveContext<'a> {
    pub environment: &'a Environment,
    pub extensions: &'a ExtensionPipeline,
    pub donors: &'a DonorStore,
    /// Name the host asked for.
    pub target: &'a str,
    pub mode: WeaveMode,
    /// Synthetic units staged by this call.
    pub synthetic: &'a PendingSynthetic,
}

impl WeaveContext<'_> {
    pub fn is_generation(&self) -> bool {
        self.mode == WeaveMode::Generate
    }

    /// Stage a synthetic unit. It reaches the registry only if this call
    /// succeeds.
    pub fn register_synthetic(&self, info: SyntheticClassInfo) {
        self.synthetic.stage(info);
    }
}

/// Result of applying donors to one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeaveOutcome {
    /// Whether the tree was changed and must be re-encoded.
    pub modified: bool,
    /// Donors whose behavior the target now depends on.
    pub donors_used: Vec<String>,
}

impl WeaveOutcome {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn modified_by<I, S>(donors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            modified: true,
            donors_used: donors.into_iter().map(Into::into).collect(),
        }
    }
}

/// Answer of a generation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    /// The tree was populated and should be encoded.
    Produced,
    /// This collaborator does not own the requested name.
    Declined,
}

/// Merges donor behavior into target trees.
pub trait WeavingService: Send + Sync {
    fn apply(&self, ctx: &WeaveContext<'_>, tree: &mut ClassTree)
        -> Result<WeaveOutcome, WeavingError>;

    /// Self-check of the weaving configuration. No transformation side effects.
    fn audit(&self, _environment: &Environment) -> Result<(), WeavingError> {
        Ok(())
    }
}

/// Synthesizes units that have no original bytes.
pub trait GenerationService: Send + Sync {
    fn generate(
        &self,
        ctx: &WeaveContext<'_>,
        name: &str,
        tree: &mut ClassTree,
    ) -> Result<Generation, WeavingError>;
}

/// Weaver that never changes anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughWeaver;

impl WeavingService for PassthroughWeaver {
    fn apply(
        &self,
        _ctx: &WeaveContext<'_>,
        _tree: &mut ClassTree,
    ) -> Result<WeaveOutcome, WeavingError> {
        Ok(WeaveOutcome::unchanged())
    }
}

/// Generator that owns no names.
#[derive(Debug, Default, Clone, Copy)]
pub struct DecliningGenerator;

impl GenerationService for DecliningGenerator {
    fn generate(
        &self,
        _ctx: &WeaveContext<'_>,
        _name: &str,
        _tree: &mut ClassTree,
    ) -> Result<Generation, WeavingError> {
        Ok(Generation::Declined)
    }
}
