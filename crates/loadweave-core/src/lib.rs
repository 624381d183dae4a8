//! Load-time transformation orchestrator.
//!
//! This crate is the authority a host loading pipeline consults for every
//! compiled unit it is about to define. It does not implement weaving itself;
//! it coordinates the collaborators that do.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────┐
//!  host loader ──►│ TransformerCore  │──► bytes | None | TransformError
//!                 └────────┬─────────┘
//!        ┌─────────────┬───┴─────────┬───────────────┬──────────────┐
//!        ▼             ▼             ▼               ▼              ▼
//!   ClassCodec   WeavingService  GenerationService  Extension    Reload
//!   (decode /    (apply donors)  (synthesize)       Pipeline     Coordinator
//!    encode)                                        (phases,     (donor →
//!                                                    synthetic)   targets)
//! ```
//!
//! ## Key Modules
//!
//! - [`environment`] / [`guard`] - one orchestrator per [`Environment`]
//! - [`transformer`] - the per-unit pipeline (`transform`, `generate`, `audit`, `reload`)
//! - [`phases`] - ordered extension phases and the default checks
//! - [`synthetic`] - registry of generated units
//! - [`reload`] - donor → target dependency index
//! - [`codec`] - binary form of a unit
//! - [`config`] - JSON configuration with `LOADWEAVE_*` overrides

pub mod codec;
pub mod config;
pub mod environment;
pub mod errors;
pub mod guard;
pub mod phases;
pub mod reload;
pub mod services;
pub mod synthetic;
pub mod transformer;

// Re-export commonly used types at crate root
pub use codec::{BcsClassCodec, ClassCodec};
pub use config::TransformerConfig;
pub use environment::{ActiveOrchestrator, Environment, OrchestratorId};
pub use errors::{CodecError, PhaseVeto, TransformError, WeavingError};
pub use guard::SingletonGuard;
pub use phases::{ExtensionPipeline, Phase, PhaseAction, PhaseResult};
pub use reload::{DonorStore, ReloadCoordinator, ReloadIndex};
pub use services::{
    DecliningGenerator, Generation, GenerationService, PassthroughWeaver, WeaveContext,
    WeaveMode, WeaveOutcome, WeavingService,
};
pub use synthetic::{PendingSynthetic, SyntheticClassInfo, SyntheticClassRegistry, SyntheticKind};
pub use transformer::{TransformerBuilder, TransformerCore};
