//! loadweave
//!
//! Command-line front end for the load-time transformation orchestrator:
//!
//! - **Manifest collaborators**: donor/synthetic-unit descriptions that drive
//!   weaving and generation (see [`manifest`])
//! - **Batch runs**: transform a directory of units in parallel and report the
//!   reload dependencies it recorded (see [`batch`])
//!
//! The orchestrator itself lives in [`loadweave_core`]; the unit data model in
//! [`loadweave_types`].

pub mod batch;
pub mod manifest;

pub use batch::{run_batch, BatchReport, UnitReport, UnitStatus};
pub use manifest::{orchestrator, DonorSpec, Manifest, ManifestGenerator, ManifestWeaver, SyntheticSpec};
