//! Batch command - transform a directory of units in parallel

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use loadweave::batch::{run_batch, BatchReport, UnitStatus};
use loadweave::manifest::{orchestrator, Manifest};
use loadweave_core::TransformerConfig;

#[derive(Parser, Debug)]
pub struct BatchCmd {
    /// Manifest describing donors and synthetic units
    #[arg(long)]
    pub manifest: PathBuf,

    /// Directory holding <name>.unit files
    #[arg(long)]
    pub dir: PathBuf,

    /// Directory receiving the transformed units
    #[arg(long)]
    pub out_dir: PathBuf,
}

impl BatchCmd {
    pub fn execute(&self, config: TransformerConfig, json_output: bool) -> Result<()> {
        let manifest = Manifest::load(&self.manifest)?;
        let core = orchestrator(config, manifest)?;
        let report = run_batch(&core, &self.dir, &self.out_dir)?;

        if json_output {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", format_report(&report));
        }
        Ok(())
    }
}

fn format_report(report: &BatchReport) -> String {
    let mut out = String::new();
    for unit in &report.units {
        let status = match unit.status {
            UnitStatus::Unchanged => "unchanged",
            UnitStatus::Woven => "woven",
            UnitStatus::Failed => "FAILED",
        };
        out.push_str(&format!("{status:<9} {}", unit.name));
        if let Some(error) = &unit.error {
            out.push_str(&format!(": {error}"));
        }
        out.push('\n');
    }
    out.push_str(&format!(
        "\n{} units: {} woven, {} unchanged, {} failed\n",
        report.units.len(),
        report.count(UnitStatus::Woven),
        report.count(UnitStatus::Unchanged),
        report.count(UnitStatus::Failed)
    ));
    if !report.reload.is_empty() {
        out.push_str("\nReload dependencies:\n");
        for (donor, targets) in &report.reload {
            out.push_str(&format!("  {donor} -> {}\n", targets.join(", ")));
        }
    }
    out
}
