//! Ordered phase registry plus the synthetic-class registry.

use std::sync::Arc;

use loadweave_types::ClassTree;
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use super::{Phase, PhaseAction, PhaseResult};
use crate::errors::WeavingError;
use crate::services::WeaveContext;
use crate::synthetic::SyntheticClassRegistry;

/// Phases in registration order, shared with weaving collaborators.
///
/// Hooks run on a snapshot of the list taken when the hook pass starts, so a
/// phase registered mid-pass only takes part from the next unit on.
pub struct ExtensionPipeline {
    phases: RwLock<Vec<Arc<dyn Phase>>>,
    synthetic: Arc<SyntheticClassRegistry>,
}

impl ExtensionPipeline {
    pub fn new(synthetic: Arc<SyntheticClassRegistry>) -> Self {
        Self {
            phases: RwLock::new(Vec::new()),
            synthetic,
        }
    }

    /// Append `phase` to the end of the pipeline.
    ///
    /// Returns `false` (and keeps the existing phase) if a phase with the same
    /// name is already registered.
    pub fn register(&self, phase: Arc<dyn Phase>) -> bool {
        let mut phases = self.phases.write();
        if phases.iter().any(|p| p.name() == phase.name()) {
            warn!(phase = phase.name(), "phase already registered, ignoring");
            return false;
        }
        debug!(phase = phase.name(), position = phases.len(), "phase registered");
        phases.push(phase);
        true
    }

    /// Look up a registered phase by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Phase>> {
        self.phases.read().iter().find(|p| p.name() == name).cloned()
    }

    /// Names of all registered phases, in execution order.
    pub fn phase_names(&self) -> Vec<String> {
        self.phases
            .read()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.phases.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.read().is_empty()
    }

    /// Registry of units manufactured by generation collaborators.
    pub fn synthetic_classes(&self) -> &Arc<SyntheticClassRegistry> {
        &self.synthetic
    }

    fn active(&self, ctx: &WeaveContext<'_>) -> Vec<Arc<dyn Phase>> {
        self.phases
            .read()
            .iter()
            .filter(|p| p.is_active(ctx.environment))
            .cloned()
            .collect()
    }

    fn run(
        &self,
        ctx: &WeaveContext<'_>,
        tree: &mut ClassTree,
        hook: &str,
        call: impl Fn(&dyn Phase, &WeaveContext<'_>, &mut ClassTree) -> PhaseResult,
    ) -> Result<bool, WeavingError> {
        let mut modified = false;
        for phase in self.active(ctx) {
            match call(phase.as_ref(), ctx, tree) {
                Ok(action) => {
                    trace!(phase = phase.name(), hook, ?action, unit = ctx.target, "phase ran");
                    modified |= action.is_modified();
                }
                Err(veto) => {
                    warn!(
                        phase = phase.name(),
                        hook,
                        unit = ctx.target,
                        reason = %veto,
                        "phase vetoed unit"
                    );
                    return Err(WeavingError::Vetoed {
                        phase: phase.name().to_string(),
                        veto,
                    });
                }
            }
        }
        Ok(modified)
    }

    /// Run every active phase's `pre_apply`. Returns whether any phase changed the tree.
    pub fn pre_apply(
        &self,
        ctx: &WeaveContext<'_>,
        tree: &mut ClassTree,
    ) -> Result<bool, WeavingError> {
        self.run(ctx, tree, "pre_apply", |phase, ctx, tree| phase.pre_apply(ctx, tree))
    }

    /// Run every active phase's `post_apply`. Returns whether any phase changed the tree.
    pub fn post_apply(
        &self,
        ctx: &WeaveContext<'_>,
        tree: &mut ClassTree,
    ) -> Result<bool, WeavingError> {
        self.run(ctx, tree, "post_apply", |phase, ctx, tree| phase.post_apply(ctx, tree))
    }

    /// Run every active phase's `export` hook on a finished unit.
    pub fn export(&self, ctx: &WeaveContext<'_>, tree: &ClassTree) {
        for phase in self.active(ctx) {
            phase.export(ctx, tree);
        }
    }
}

impl std::fmt::Debug for ExtensionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionPipeline")
            .field("phases", &self.phase_names())
            .field("synthetic_classes", &self.synthetic.len())
            .finish()
    }
}
