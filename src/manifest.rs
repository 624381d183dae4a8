//! Manifest-driven reference collaborators.
//!
//! A manifest describes donors and synthetic units as JSON:
//!
//! ```json
//! {
//!   "donors": [
//!     { "name": "mix.Audit", "targets": ["app.Service"],
//!       "members": [{ "kind": "method", "name": "audit", "descriptor": "()V" }] }
//!   ],
//!   "synthetic": [
//!     { "name": "app.Service$Args", "source": "mix.Audit",
//!       "members": [{ "kind": "field", "name": "arg0", "descriptor": "I" }] }
//!   ]
//! }
//! ```
//!
//! [`ManifestWeaver`] copies each donor's members into its targets.
//! [`ManifestGenerator`] produces the listed synthetic units and records them
//! in the synthetic-class registry.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use loadweave_core::{
    Environment, Generation, GenerationService, SyntheticClassInfo, SyntheticKind,
    TransformerConfig, TransformerCore, WeaveContext, WeaveOutcome, WeavingError, WeavingService,
};
use loadweave_types::{ClassTree, Member};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorSpec {
    pub name: String,
    /// Targets that receive this donor's members.
    pub targets: Vec<String>,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    pub name: String,
    /// Donor or tool the unit is derived from.
    pub source: String,
    #[serde(default = "default_synthetic_kind")]
    pub kind: SyntheticKind,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_synthetic_kind() -> SyntheticKind {
    SyntheticKind::Inner
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub donors: Vec<DonorSpec>,
    #[serde(default)]
    pub synthetic: Vec<SyntheticSpec>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Donors that list `target`, in manifest order.
    pub fn donors_for<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a DonorSpec> + 'a {
        self.donors
            .iter()
            .filter(move |d| d.targets.iter().any(|t| t == target))
    }

    pub fn synthetic(&self, name: &str) -> Option<&SyntheticSpec> {
        self.synthetic.iter().find(|s| s.name == name)
    }

    /// Structural problems that make the manifest unusable.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (i, donor) in self.donors.iter().enumerate() {
            if donor.name.is_empty() {
                problems.push(format!("donor #{i} has an empty name"));
            }
            if self.donors[..i].iter().any(|d| d.name == donor.name) {
                problems.push(format!("donor '{}' is listed twice", donor.name));
            }
            if donor.targets.iter().any(|t| t == &donor.name) {
                problems.push(format!("donor '{}' targets itself", donor.name));
            }
        }
        for (i, spec) in self.synthetic.iter().enumerate() {
            if self.synthetic[..i].iter().any(|s| s.name == spec.name) {
                problems.push(format!("synthetic unit '{}' is listed twice", spec.name));
            }
        }
        problems
    }
}

/// Copies donor members into every target the manifest lists.
///
/// When a donor has been reloaded, its latest members are used instead of the
/// manifest's.
#[derive(Debug, Clone)]
pub struct ManifestWeaver {
    manifest: Arc<Manifest>,
}

impl ManifestWeaver {
    pub fn new(manifest: Arc<Manifest>) -> Self {
        Self { manifest }
    }
}

impl WeavingService for ManifestWeaver {
    fn apply(
        &self,
        ctx: &WeaveContext<'_>,
        tree: &mut ClassTree,
    ) -> Result<WeaveOutcome, WeavingError> {
        let mut outcome = WeaveOutcome::unchanged();
        for donor in self.manifest.donors_for(ctx.target) {
            let members = match ctx.donors.get(&donor.name) {
                Some(latest) => latest.members,
                None => donor.members.clone(),
            };
            let mut added = 0usize;
            for member in members {
                if tree.add_member(member) {
                    added += 1;
                }
            }
            debug!(donor = %donor.name, unit = ctx.target, added, "applied donor");
            outcome.modified |= added > 0;
            outcome.donors_used.push(donor.name.clone());
        }
        Ok(outcome)
    }

    fn audit(&self, _environment: &Environment) -> Result<(), WeavingError> {
        let problems = self.manifest.problems();
        if problems.is_empty() {
            return Ok(());
        }
        Err(WeavingError::service(problems.join("; ")))
    }
}

/// Produces the synthetic units the manifest declares.
#[derive(Debug, Clone)]
pub struct ManifestGenerator {
    manifest: Arc<Manifest>,
}

impl ManifestGenerator {
    pub fn new(manifest: Arc<Manifest>) -> Self {
        Self { manifest }
    }
}

impl GenerationService for ManifestGenerator {
    fn generate(
        &self,
        ctx: &WeaveContext<'_>,
        name: &str,
        tree: &mut ClassTree,
    ) -> Result<Generation, WeavingError> {
        let Some(spec) = self.manifest.synthetic(name) else {
            return Ok(Generation::Declined);
        };
        for member in &spec.members {
            tree.add_member(member.clone());
        }

        let mut info = SyntheticClassInfo::new(name, spec.kind.clone(), spec.source.clone());
        if let Some(description) = &spec.description {
            info = info.with_description(description.clone());
        }
        ctx.register_synthetic(info);
        Ok(Generation::Produced)
    }
}

/// Build an orchestrator driven by `manifest` in a fresh environment.
pub fn orchestrator(config: TransformerConfig, manifest: Manifest) -> Result<TransformerCore> {
    let manifest = Arc::new(manifest);
    let environment = Arc::new(Environment::from_config(&config).with_label("cli"));
    let core = TransformerCore::builder(environment)
        .config(config)
        .weaver(ManifestWeaver::new(manifest.clone()))
        .generator(ManifestGenerator::new(manifest))
        .build()?;
    Ok(core)
}
