//! Phases every orchestrator registers at construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use loadweave_types::ClassTree;
use tracing::{debug, warn};

use super::{Phase, PhaseAction, PhaseResult};
use crate::config::TransformerConfig;
use crate::environment::Environment;
use crate::errors::PhaseVeto;
use crate::services::WeaveContext;

/// Build the default phases for `config`, in their fixed order.
pub fn default_phases(config: &TransformerConfig) -> Vec<Arc<dyn Phase>> {
    vec![
        Arc::new(IdentityCheckPhase),
        Arc::new(MemberCheckPhase::new(config.verify_members)),
        Arc::new(ExportPhase::new(config.export_dir.clone())),
    ]
}

/// Rejects trees that cannot be a valid unit: an empty name, a zero version or
/// a unit that names itself as its super-type.
///
/// Generated units must also fit the environment's compatibility level. Loaded
/// units keep whatever version the loader handed in.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityCheckPhase;

impl Phase for IdentityCheckPhase {
    fn name(&self) -> &str {
        "check-identity"
    }

    fn post_apply(&self, ctx: &WeaveContext<'_>, tree: &mut ClassTree) -> PhaseResult {
        if tree.name().is_empty() {
            return Err(PhaseVeto::new("unit has an empty name"));
        }
        if tree.version == 0 {
            return Err(PhaseVeto::new(format!(
                "unit '{}' has binary version 0",
                tree.name()
            )));
        }
        let level = ctx.environment.compatibility_level();
        if ctx.is_generation() && !level.supports(tree.version) {
            return Err(PhaseVeto::new(format!(
                "unit '{}' has binary version {} above compatibility level {}",
                tree.name(),
                tree.version,
                level
            )));
        }
        if tree.super_name.as_deref() == Some(tree.name()) {
            return Err(PhaseVeto::new(format!(
                "unit '{}' declares itself as its super-type",
                tree.name()
            )));
        }
        Ok(PhaseAction::Unchanged)
    }
}

/// Rejects trees declaring two members with the same kind, name and descriptor.
#[derive(Debug, Clone, Copy)]
pub struct MemberCheckPhase {
    enabled: bool,
}

impl MemberCheckPhase {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Phase for MemberCheckPhase {
    fn name(&self) -> &str {
        "check-members"
    }

    fn is_active(&self, _environment: &Environment) -> bool {
        self.enabled
    }

    fn post_apply(&self, _ctx: &WeaveContext<'_>, tree: &mut ClassTree) -> PhaseResult {
        match tree.first_duplicate() {
            Some(dup) => Err(PhaseVeto::new(format!(
                "duplicate {} {}:{} in '{}'",
                dup.kind,
                dup.name,
                dup.descriptor,
                tree.name()
            ))),
            None => Ok(PhaseAction::Unchanged),
        }
    }
}

/// Writes `<export_dir>/<unit name>.json` for every finished unit.
///
/// Export failures are logged and never fail the load.
#[derive(Debug, Clone)]
pub struct ExportPhase {
    dir: Option<PathBuf>,
}

impl ExportPhase {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Snapshot path for `unit`, or `None` when exporting is off or the name
    /// could escape the export directory.
    pub fn path_for(&self, unit: &str) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        is_safe_file_stem(unit).then(|| dir.join(format!("{unit}.json")))
    }

    fn write(&self, path: &Path, tree: &ClassTree) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(tree)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl Phase for ExportPhase {
    fn name(&self) -> &str {
        "export"
    }

    fn is_active(&self, _environment: &Environment) -> bool {
        self.dir.is_some()
    }

    fn export(&self, _ctx: &WeaveContext<'_>, tree: &ClassTree) {
        let Some(path) = self.path_for(tree.name()) else {
            if self.dir.is_some() {
                warn!(unit = tree.name(), "refusing to export unit with unsafe name");
            }
            return;
        };
        match self.write(&path, tree) {
            Ok(()) => debug!(unit = tree.name(), path = %path.display(), "exported unit"),
            Err(e) => warn!(unit = tree.name(), path = %path.display(), error = %e, "export failed"),
        }
    }
}

/// A unit name maps to a single file inside the export directory only when it
/// has no separators, no parent references and no leading dot.
fn is_safe_file_stem(unit: &str) -> bool {
    !unit.is_empty()
        && !unit.starts_with('.')
        && !unit.contains("..")
        && !unit.contains(['/', '\\', '\0'])
}
