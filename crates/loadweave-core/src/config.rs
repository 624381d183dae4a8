//! Orchestrator configuration.
//!
//! Loaded from a JSON file, then optionally overridden from the process
//! environment:
//!
//! | Variable                    | Field                 |
//! |-----------------------------|-----------------------|
//! | `LOADWEAVE_COMPAT_LEVEL`    | `compatibility_level` |
//! | `LOADWEAVE_EXPORT_DIR`      | `export_dir`          |
//! | `LOADWEAVE_VERIFY_MEMBERS`  | `verify_members`      |

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use loadweave_types::env_utils::{env_flag, env_var};
use loadweave_types::{CompatibilityLevel, DEFAULT_SUPER_TYPE};
use serde::{Deserialize, Serialize};

pub const ENV_COMPAT_LEVEL: &str = "LOADWEAVE_COMPAT_LEVEL";
pub const ENV_EXPORT_DIR: &str = "LOADWEAVE_EXPORT_DIR";
pub const ENV_VERIFY_MEMBERS: &str = "LOADWEAVE_VERIFY_MEMBERS";

/// Default display name of an orchestrator.
pub const DEFAULT_ORCHESTRATOR_NAME: &str = "loadweave";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    /// Display name used for registration and logs.
    pub name: String,

    /// Seeds the level of [`Environment::from_config`](crate::Environment::from_config)
    /// (default: v52). Generated units are stamped with the environment's
    /// level, so an orchestrator built against a different environment ignores
    /// this value and logs a warning.
    pub compatibility_level: CompatibilityLevel,

    /// Super-type assigned to generated stubs.
    pub default_super_type: String,

    /// Reject woven units that declare the same member twice (default: true).
    pub verify_members: bool,

    /// Write a JSON snapshot of every woven or generated unit here.
    pub export_dir: Option<PathBuf>,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ORCHESTRATOR_NAME.to_string(),
            compatibility_level: CompatibilityLevel::default(),
            default_super_type: DEFAULT_SUPER_TYPE.to_string(),
            verify_members: true,
            export_dir: None,
        }
    }
}

impl TransformerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Apply `LOADWEAVE_*` overrides from the process environment.
    ///
    /// Unparseable values are ignored and the configured value kept.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Some(level) = env_var::<CompatibilityLevel>(ENV_COMPAT_LEVEL) {
            self.compatibility_level = level;
        }
        if let Ok(dir) = std::env::var(ENV_EXPORT_DIR) {
            if !dir.trim().is_empty() {
                self.export_dir = Some(PathBuf::from(dir));
            }
        }
        if let Some(verify) = env_flag(ENV_VERIFY_MEMBERS) {
            self.verify_members = verify;
        }
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_compatibility_level(mut self, level: CompatibilityLevel) -> Self {
        self.compatibility_level = level;
        self
    }

    pub fn with_default_super_type(mut self, super_type: impl Into<String>) -> Self {
        self.default_super_type = super_type.into();
        self
    }

    pub fn with_verify_members(mut self, verify: bool) -> Self {
        self.verify_members = verify;
        self
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(dir.into());
        self
    }
}
