//! CLI subcommand implementations for loadweave

pub mod batch;
pub mod encode;
pub mod inspect;
pub mod transform;

use std::path::Path;

use anyhow::{Context, Result};
use loadweave_core::TransformerConfig;

/// Load the configuration file if given, then apply `LOADWEAVE_*` overrides.
pub fn load_config(path: Option<&Path>) -> Result<TransformerConfig> {
    let config = match path {
        Some(path) => TransformerConfig::load(path)?,
        None => TransformerConfig::default(),
    };
    Ok(config.apply_env_overrides())
}

pub fn read_unit(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read unit {}", path.display()))
}

pub fn write_unit(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write unit {}", path.display()))
}
