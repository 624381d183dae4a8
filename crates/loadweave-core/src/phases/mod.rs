//! # Phase-Based Extension Pipeline
//!
//! Every unit the orchestrator weaves or generates passes through an ordered
//! list of phases. Phases are values implementing [`Phase`]; they are
//! registered once (defaults at construction, extras through
//! [`ExtensionPipeline::register`]) and invoked strictly by position.
//!
//! ## Hook Order
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   Per-unit pipeline                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │ pre_apply   (all active phases, registration order)           │
//! │    - may mutate the tree in place, may veto                   │
//! ├──────────────────────────────────────────────────────────────┤
//! │ weave / generate   (external collaborator)                    │
//! ├──────────────────────────────────────────────────────────────┤
//! │ post_apply  (all active phases, registration order)           │
//! │    - may mutate the tree in place, may veto                   │
//! ├──────────────────────────────────────────────────────────────┤
//! │ encode      (codec)                                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │ export      (all active phases; side effects only, no veto)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A veto anywhere aborts the unit exactly like a weaving failure: the
//! partially processed tree is dropped and the host sees an error.
//!
//! ## Default Phases
//!
//! | Position | Name             | Hook        | Purpose                               |
//! |----------|------------------|-------------|---------------------------------------|
//! | 1        | `check-identity` | post_apply  | name, version, generated-unit ceiling, self-inheritance |
//! | 2        | `check-members`  | post_apply  | duplicate member signatures           |
//! | 3        | `export`         | export      | JSON snapshot to `export_dir`         |

pub mod defaults;
pub mod pipeline;

use loadweave_types::ClassTree;

use crate::environment::Environment;
use crate::errors::PhaseVeto;
use crate::services::WeaveContext;

// Re-export key types
pub use defaults::{default_phases, ExportPhase, IdentityCheckPhase, MemberCheckPhase};
pub use pipeline::ExtensionPipeline;

/// Whether a hook changed the tree it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseAction {
    Unchanged,
    Modified,
}

impl PhaseAction {
    pub fn is_modified(self) -> bool {
        matches!(self, PhaseAction::Modified)
    }
}

pub type PhaseResult = Result<PhaseAction, PhaseVeto>;

/// One pluggable step of the pipeline.
///
/// Hooks may only mutate the tree in place. Replacing the tree with one of a
/// different name is detected by the orchestrator and rejected.
pub trait Phase: Send + Sync {
    /// Stable name, unique within a pipeline.
    fn name(&self) -> &str;

    /// Whether the phase participates for this environment.
    fn is_active(&self, _environment: &Environment) -> bool {
        true
    }

    fn pre_apply(&self, _ctx: &WeaveContext<'_>, _tree: &mut ClassTree) -> PhaseResult {
        Ok(PhaseAction::Unchanged)
    }

    fn post_apply(&self, _ctx: &WeaveContext<'_>, _tree: &mut ClassTree) -> PhaseResult {
        Ok(PhaseAction::Unchanged)
    }

    /// Called once the unit has been encoded successfully.
    fn export(&self, _ctx: &WeaveContext<'_>, _tree: &ClassTree) {}
}
