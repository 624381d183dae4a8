//! Encode command - JSON unit tree to unit bytes

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use loadweave_core::{BcsClassCodec, ClassCodec};
use loadweave_types::encoding::sha256_hex;
use loadweave_types::ClassTree;
use serde_json::json;

use super::write_unit;

#[derive(Parser, Debug)]
pub struct EncodeCmd {
    /// JSON file holding one unit tree
    pub input: PathBuf,

    /// Where to write the encoded unit
    #[arg(short, long)]
    pub output: PathBuf,
}

impl EncodeCmd {
    pub fn execute(&self, json_output: bool) -> Result<()> {
        let raw = std::fs::read_to_string(&self.input)
            .with_context(|| format!("Failed to read {}", self.input.display()))?;
        let tree: ClassTree = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid unit tree in {}", self.input.display()))?;

        let bytes = BcsClassCodec.encode(&tree)?;
        write_unit(&self.output, &bytes)?;

        if json_output {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "name": tree.name(),
                    "output": self.output.display().to_string(),
                    "size": bytes.len(),
                    "sha256": sha256_hex(&bytes),
                }))?
            );
        } else {
            println!(
                "Encoded {} ({} bytes) -> {}",
                tree.name(),
                bytes.len(),
                self.output.display()
            );
        }
        Ok(())
    }
}
