//! # Transformer Core
//!
//! [`TransformerCore`] is the single entry point the host loading pipeline
//! talks to. Per call it runs:
//!
//! ```text
//!  transform(name, bytes)
//!     │
//!     ├─ name absent ───────────────────────────────► bytes (passthrough)
//!     ├─ bytes absent ──► generate(name) ───────────► new bytes | None
//!     │
//!     ▼
//!  INIT ─► DECODED ─► WOVEN ─┬─ unchanged ───────────► original bytes
//!                            ├─ modified ─► ENCODED ─► new bytes
//!                            └─ failed ─────────────► TransformError
//! ```
//!
//! Nothing produced mid-pipeline escapes the call: a failure at any stage
//! drops the tree and returns an error, never partially woven bytes.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use loadweave_core::{Environment, TransformerCore};
//! use loadweave_core::codec::{BcsClassCodec, ClassCodec};
//! use loadweave_types::ClassTree;
//!
//! let env = Arc::new(Environment::default());
//! let core = TransformerCore::builder(env).build()?;
//!
//! let bytes = BcsClassCodec.encode(&ClassTree::new("pkg.Foo", 52)).unwrap();
//! let out = core.transform(Some("pkg.Foo"), Some(&bytes))?;
//! assert_eq!(out.as_deref(), Some(&bytes[..]));
//! # Ok::<(), loadweave_core::TransformError>(())
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use loadweave_types::ClassTree;
use tracing::{debug, info, warn};

use crate::codec::{BcsClassCodec, ClassCodec};
use crate::config::TransformerConfig;
use crate::environment::{ActiveOrchestrator, Environment, OrchestratorId};
use crate::errors::{TransformError, WeavingError};
use crate::guard::SingletonGuard;
use crate::phases::{default_phases, ExtensionPipeline, Phase};
use crate::reload::ReloadCoordinator;
use crate::services::{
    DecliningGenerator, Generation, GenerationService, PassthroughWeaver, WeaveContext,
    WeaveMode, WeaveOutcome, WeavingService,
};
use crate::synthetic::{PendingSynthetic, SyntheticClassRegistry};

/// The orchestrator. One per [`Environment`].
pub struct TransformerCore {
    identity: ActiveOrchestrator,
    environment: Arc<Environment>,
    config: TransformerConfig,
    codec: Box<dyn ClassCodec>,
    weaver: Box<dyn WeavingService>,
    generator: Box<dyn GenerationService>,
    extensions: ExtensionPipeline,
    reload: ReloadCoordinator,
}

/// Collects collaborators before claiming the environment.
pub struct TransformerBuilder {
    environment: Arc<Environment>,
    config: TransformerConfig,
    codec: Box<dyn ClassCodec>,
    weaver: Box<dyn WeavingService>,
    generator: Box<dyn GenerationService>,
    phases: Vec<Arc<dyn Phase>>,
}

impl TransformerBuilder {
    pub fn config(mut self, config: TransformerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn codec(mut self, codec: impl ClassCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    pub fn weaver(mut self, weaver: impl WeavingService + 'static) -> Self {
        self.weaver = Box::new(weaver);
        self
    }

    pub fn generator(mut self, generator: impl GenerationService + 'static) -> Self {
        self.generator = Box::new(generator);
        self
    }

    /// Append a phase after the defaults.
    pub fn phase(mut self, phase: impl Phase + 'static) -> Self {
        self.phases.push(Arc::new(phase));
        self
    }

    /// Claim the environment and assemble the orchestrator.
    ///
    /// Fails with [`TransformError::DuplicatePhase`] if two phases share a name
    /// and with [`TransformError::AlreadyActive`] if the environment already
    /// has an orchestrator, whether or not that orchestrator is still alive.
    /// The environment is only claimed once the pipeline is valid.
    pub fn build(self) -> Result<TransformerCore, TransformError> {
        let synthetic = Arc::new(SyntheticClassRegistry::new());
        let extensions = ExtensionPipeline::new(synthetic);
        for phase in default_phases(&self.config).into_iter().chain(self.phases) {
            let name = phase.name().to_string();
            if !extensions.register(phase) {
                return Err(TransformError::DuplicatePhase { name });
            }
        }

        let identity = ActiveOrchestrator::new(self.config.name.clone());
        SingletonGuard::try_register(&self.environment, identity.clone())?;

        let level = self.environment.compatibility_level();
        if self.config.compatibility_level != level {
            warn!(
                orchestrator = %identity,
                configured = %self.config.compatibility_level,
                environment = %level,
                "configured compatibility level differs from the environment; using the environment's"
            );
        }

        info!(
            orchestrator = %identity,
            environment = self.environment.label(),
            compatibility = %self.environment.compatibility_level(),
            phases = ?extensions.phase_names(),
            "transformer ready"
        );

        Ok(TransformerCore {
            identity,
            environment: self.environment,
            config: self.config,
            codec: self.codec,
            weaver: self.weaver,
            generator: self.generator,
            extensions,
            reload: ReloadCoordinator::new(),
        })
    }
}

impl TransformerCore {
    /// Start building an orchestrator for `environment`.
    ///
    /// Defaults: [`BcsClassCodec`], [`PassthroughWeaver`], [`DecliningGenerator`]
    /// and [`TransformerConfig::default`].
    pub fn builder(environment: Arc<Environment>) -> TransformerBuilder {
        TransformerBuilder {
            environment,
            config: TransformerConfig::default(),
            codec: Box::new(BcsClassCodec),
            weaver: Box::new(PassthroughWeaver),
            generator: Box::new(DecliningGenerator),
            phases: Vec::new(),
        }
    }

    /// Construct with explicit collaborators and default configuration.
    pub fn new(
        environment: Arc<Environment>,
        codec: impl ClassCodec + 'static,
        weaver: impl WeavingService + 'static,
        generator: impl GenerationService + 'static,
    ) -> Result<Self, TransformError> {
        Self::builder(environment)
            .codec(codec)
            .weaver(weaver)
            .generator(generator)
            .build()
    }

    /// Display name of this orchestrator.
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn id(&self) -> OrchestratorId {
        self.identity.id
    }

    /// The orchestrator must never be wrapped by another host transformer.
    pub fn is_delegation_excluded(&self) -> bool {
        true
    }

    pub fn environment(&self) -> &Arc<Environment> {
        &self.environment
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    /// Phase registration capability and synthetic-unit registry.
    pub fn extensions(&self) -> &ExtensionPipeline {
        &self.extensions
    }

    pub fn synthetic_classes(&self) -> &Arc<SyntheticClassRegistry> {
        self.extensions.synthetic_classes()
    }

    pub fn reload_coordinator(&self) -> &ReloadCoordinator {
        &self.reload
    }

    fn context<'a>(
        &'a self,
        target: &'a str,
        mode: WeaveMode,
        synthetic: &'a PendingSynthetic,
    ) -> WeaveContext<'a> {
        WeaveContext {
            environment: &self.environment,
            extensions: &self.extensions,
            donors: self.reload.donors(),
            target,
            mode,
            synthetic,
        }
    }

    fn publish(&self, name: &str, pending: &PendingSynthetic) {
        let added = pending.commit(self.extensions.synthetic_classes());
        if added > 0 {
            debug!(unit = name, added, "published synthetic units");
        }
    }

    /// Host entry point.
    ///
    /// - no name: `original` is returned as is
    /// - no bytes: the unit is generated; `None` if nobody owns the name
    /// - otherwise: `Cow::Borrowed(original)` if weaving changed nothing,
    ///   `Cow::Owned` with the re-encoded unit if it did
    pub fn transform<'b>(
        &self,
        name: Option<&str>,
        original: Option<&'b [u8]>,
    ) -> Result<Option<Cow<'b, [u8]>>, TransformError> {
        let Some(name) = name else {
            return Ok(original.map(Cow::Borrowed));
        };
        match original {
            None => Ok(self.generate(name)?.map(Cow::Owned)),
            Some(bytes) => self.transform_bytes(name, bytes).map(Some),
        }
    }

    /// Decode, weave and (only if modified) re-encode one unit.
    ///
    /// Synthetic units registered while weaving are published only if the
    /// whole call succeeds.
    pub fn transform_bytes<'b>(
        &self,
        name: &str,
        original: &'b [u8],
    ) -> Result<Cow<'b, [u8]>, TransformError> {
        let mut tree = self
            .codec
            .decode(original)
            .map_err(|source| TransformError::Decode {
                name: name.to_string(),
                source,
            })?;
        debug!(unit = name, members = tree.members.len(), "decoded");

        let pending = PendingSynthetic::new();
        let ctx = self.context(name, WeaveMode::Transform, &pending);
        let outcome = self
            .weave(&ctx, &mut tree)
            .map_err(|source| TransformError::Weaving {
                name: name.to_string(),
                source,
            })?;

        if !outcome.modified {
            debug!(unit = name, "unchanged, returning original bytes");
            self.reload.record(name, &outcome.donors_used);
            self.publish(name, &pending);
            return Ok(Cow::Borrowed(original));
        }

        let encoded = self
            .codec
            .encode(&tree)
            .map_err(|source| TransformError::Encode {
                name: name.to_string(),
                source,
            })?;
        debug!(
            unit = name,
            donors = ?outcome.donors_used,
            size = encoded.len(),
            "woven and encoded"
        );

        self.reload.record(name, &outcome.donors_used);
        self.publish(name, &pending);
        self.extensions.export(&ctx, &tree);
        Ok(Cow::Owned(encoded))
    }

    /// Tree-level transform for hosts that already hold a decoded unit.
    ///
    /// `tree` is only updated if weaving succeeds. Returns whether it changed.
    pub fn transform_tree(&self, name: &str, tree: &mut ClassTree) -> Result<bool, TransformError> {
        let pending = PendingSynthetic::new();
        let ctx = self.context(name, WeaveMode::Transform, &pending);
        let mut working = tree.clone();
        let outcome = self
            .weave(&ctx, &mut working)
            .map_err(|source| TransformError::Weaving {
                name: name.to_string(),
                source,
            })?;

        self.reload.record(name, &outcome.donors_used);
        self.publish(name, &pending);
        if outcome.modified {
            self.extensions.export(&ctx, &working);
            *tree = working;
        }
        Ok(outcome.modified)
    }

    fn weave(
        &self,
        ctx: &WeaveContext<'_>,
        tree: &mut ClassTree,
    ) -> Result<WeaveOutcome, WeavingError> {
        let identity = tree.name().to_string();

        let pre = self.extensions.pre_apply(ctx, tree)?;
        let mut outcome = self.weaver.apply(ctx, tree)?;
        let post = self.extensions.post_apply(ctx, tree)?;
        check_identity(&identity, tree)?;

        outcome.modified |= pre || post;
        Ok(outcome)
    }

    /// Synthesize `name` from an empty stub.
    ///
    /// Returns `None` when the generation collaborator declines the name.
    /// Synthetic units the generator registers are published only once the
    /// unit has been encoded.
    pub fn generate(&self, name: &str) -> Result<Option<Vec<u8>>, TransformError> {
        let pending = PendingSynthetic::new();
        let ctx = self.context(name, WeaveMode::Generate, &pending);
        let mut tree = self.empty_tree(name);
        if !self.generate_staged(&ctx, &mut tree)? {
            debug!(unit = name, "generation declined");
            return Ok(None);
        }

        let encoded = self
            .codec
            .encode(&tree)
            .map_err(|source| TransformError::Encode {
                name: name.to_string(),
                source,
            })?;
        info!(unit = name, size = encoded.len(), "generated unit");

        self.publish(name, &pending);
        self.extensions.export(&ctx, &tree);
        Ok(Some(encoded))
    }

    /// Tree-level generation into a caller-supplied stub.
    ///
    /// `tree` is only updated if a unit is produced. Returns whether one was.
    pub fn generate_into(&self, name: &str, tree: &mut ClassTree) -> Result<bool, TransformError> {
        let pending = PendingSynthetic::new();
        let ctx = self.context(name, WeaveMode::Generate, &pending);
        let mut working = tree.clone();
        let produced = self.generate_staged(&ctx, &mut working)?;
        if produced {
            self.publish(name, &pending);
            *tree = working;
        }
        Ok(produced)
    }

    fn generate_staged(
        &self,
        ctx: &WeaveContext<'_>,
        tree: &mut ClassTree,
    ) -> Result<bool, TransformError> {
        self.run_generator(ctx, tree)
            .map_err(|source| TransformError::Generation {
                name: ctx.target.to_string(),
                source,
            })
    }

    fn run_generator(
        &self,
        ctx: &WeaveContext<'_>,
        tree: &mut ClassTree,
    ) -> Result<bool, WeavingError> {
        let identity = tree.name().to_string();

        self.extensions.pre_apply(ctx, tree)?;
        match self.generator.generate(ctx, ctx.target, tree)? {
            Generation::Declined => Ok(false),
            Generation::Produced => {
                self.extensions.post_apply(ctx, tree)?;
                check_identity(&identity, tree)?;
                Ok(true)
            }
        }
    }

    /// Empty stub a generator fills in: the requested name, the configured
    /// compatibility level and the default super-type.
    pub fn empty_tree(&self, name: &str) -> ClassTree {
        ClassTree::new(
            name,
            self.environment.compatibility_level().binary_version(),
        )
        .with_super(self.config.default_super_type.clone())
    }

    /// Run the weaving collaborator's self-check.
    pub fn audit(&self, environment: &Environment) -> Result<(), TransformError> {
        debug!(environment = environment.label(), "audit requested");
        self.weaver
            .audit(environment)
            .map_err(|source| TransformError::Audit { source })
    }

    /// Accept a changed donor and return the targets to retransform.
    pub fn reload(&self, donor: &str, tree: ClassTree) -> Vec<String> {
        self.reload.reload(donor, tree)
    }
}

fn check_identity(expected: &str, tree: &ClassTree) -> Result<(), WeavingError> {
    if tree.name() != expected {
        return Err(WeavingError::IdentityChanged {
            expected: expected.to_string(),
            found: tree.name().to_string(),
        });
    }
    Ok(())
}

impl std::fmt::Debug for TransformerCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerCore")
            .field("identity", &self.identity)
            .field("environment", &self.environment.label())
            .field("extensions", &self.extensions)
            .finish()
    }
}
