//! Transform command - weave or generate one unit

use std::borrow::Cow;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use loadweave::manifest::{orchestrator, Manifest};
use loadweave_core::TransformerConfig;
use loadweave_types::encoding::sha256_hex;
use serde_json::json;

use super::{read_unit, write_unit};

#[derive(Parser, Debug)]
pub struct TransformCmd {
    /// Manifest describing donors and synthetic units
    #[arg(long)]
    pub manifest: PathBuf,

    /// Qualified name of the unit being loaded
    #[arg(long)]
    pub name: String,

    /// Original unit bytes; omit to request generation
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Where to write the resulting unit
    #[arg(short, long)]
    pub output: PathBuf,
}

impl TransformCmd {
    pub fn execute(&self, config: TransformerConfig, json_output: bool) -> Result<()> {
        let manifest = Manifest::load(&self.manifest)?;
        let core = orchestrator(config, manifest)?;

        let original = self.input.as_deref().map(read_unit).transpose()?;
        let result = core.transform(Some(self.name.as_str()), original.as_deref())?;
        let (bytes, status) = match result {
            Some(Cow::Borrowed(bytes)) => (bytes.to_vec(), "unchanged"),
            Some(Cow::Owned(bytes)) if original.is_some() => (bytes, "woven"),
            Some(Cow::Owned(bytes)) => (bytes, "generated"),
            None => bail!("No generator produced unit '{}'", self.name),
        };
        write_unit(&self.output, &bytes)?;

        if json_output {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "name": self.name,
                    "status": status,
                    "output": self.output.display().to_string(),
                    "sha256": sha256_hex(&bytes),
                    "synthetic": core.synthetic_classes().entries(),
                }))?
            );
        } else {
            println!("{} {} -> {}", status, self.name, self.output.display());
        }
        Ok(())
    }
}
