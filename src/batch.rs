//! Parallel batch transformation of a directory of units.
//!
//! Every `<name>.unit` file in the input directory is pushed through
//! [`TransformerCore::transform`] on the rayon pool and written to
//! `<out_dir>/<name>.unit`. One bad unit never stops the batch; its failure is
//! recorded in the report instead.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use loadweave_core::TransformerCore;
use loadweave_types::encoding::sha256_hex;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

/// File extension of unit files.
pub const UNIT_EXTENSION: &str = "unit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Unchanged,
    Woven,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub name: String,
    pub status: UnitStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// One entry per input unit, sorted by name.
    pub units: Vec<UnitReport>,
    /// Donor → targets that would be retransformed if the donor changed.
    pub reload: BTreeMap<String, Vec<String>>,
}

impl BatchReport {
    pub fn count(&self, status: UnitStatus) -> usize {
        self.units.iter().filter(|u| u.status == status).count()
    }
}

/// Unit name encoded in a file path: `dir/pkg.Foo.unit` → `pkg.Foo`.
pub fn unit_name(path: &Path) -> Option<String> {
    if path.extension()? != UNIT_EXTENSION {
        return None;
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

/// All unit files directly inside `dir`, sorted by path.
pub fn collect_units(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read unit directory {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && unit_name(&path).is_some() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn transform_one(core: &TransformerCore, path: &Path, name: String, out_dir: &Path) -> UnitReport {
    let result = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))
        .and_then(|bytes| {
            let out = core
                .transform_bytes(&name, &bytes)
                .map_err(anyhow::Error::from)?;
            let woven = matches!(out, std::borrow::Cow::Owned(_));
            let target = out_dir.join(format!("{name}.{UNIT_EXTENSION}"));
            std::fs::write(&target, &out)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            Ok((woven, sha256_hex(&out)))
        });

    match result {
        Ok((woven, digest)) => UnitReport {
            name,
            status: if woven {
                UnitStatus::Woven
            } else {
                UnitStatus::Unchanged
            },
            sha256: Some(digest),
            error: None,
        },
        Err(e) => {
            warn!(unit = %name, error = %e, "unit failed");
            UnitReport {
                name,
                status: UnitStatus::Failed,
                sha256: None,
                error: Some(format!("{e:#}")),
            }
        }
    }
}

/// Transform every unit in `dir` into `out_dir`.
pub fn run_batch(core: &TransformerCore, dir: &Path, out_dir: &Path) -> Result<BatchReport> {
    let paths = collect_units(dir)?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let mut units: Vec<UnitReport> = paths
        .par_iter()
        .filter_map(|path| unit_name(path).map(|name| (path, name)))
        .map(|(path, name)| transform_one(core, path, name, out_dir))
        .collect();
    units.sort_by(|a, b| a.name.cmp(&b.name));

    let index = core.reload_coordinator().index();
    let reload = index
        .donors()
        .into_iter()
        .map(|donor| {
            let targets = index.targets(&donor);
            (donor, targets)
        })
        .collect();

    let report = BatchReport { units, reload };
    info!(
        units = report.units.len(),
        woven = report.count(UnitStatus::Woven),
        failed = report.count(UnitStatus::Failed),
        "batch complete"
    );
    Ok(report)
}
