//! Inspect command - decode a unit and print its shape

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use loadweave_core::{BcsClassCodec, ClassCodec};
use loadweave_types::encoding::{sha256_hex, to_hex};
use loadweave_types::ClassTree;

use super::read_unit;

#[derive(Parser, Debug)]
pub struct InspectCmd {
    /// Unit file to decode
    pub unit: PathBuf,
}

impl InspectCmd {
    pub fn execute(&self, json_output: bool) -> Result<()> {
        let bytes = read_unit(&self.unit)?;
        let tree = BcsClassCodec
            .decode(&bytes)
            .with_context(|| format!("Failed to decode {}", self.unit.display()))?;

        if json_output {
            println!("{}", serde_json::to_string_pretty(&tree)?);
        } else {
            print!("{}", format_tree(&tree, &sha256_hex(&bytes)));
        }
        Ok(())
    }
}

fn format_tree(tree: &ClassTree, digest: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("Unit:      {}\n", tree.name()));
    out.push_str(&format!("Version:   {}\n", tree.version));
    out.push_str(&format!(
        "Super:     {}\n",
        tree.super_name.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!("Members:   {}\n", tree.members.len()));
    out.push_str(&format!("SHA-256:   {digest}\n"));
    for member in &tree.members {
        out.push_str(&format!(
            "  {:<6} {}:{}",
            member.kind.to_string(),
            member.name,
            member.descriptor
        ));
        if member.access != 0 {
            out.push_str(&format!(" access=0x{:04x}", member.access));
        }
        if !member.body.is_empty() {
            out.push_str(&format!(" body={}", to_hex(&member.body)));
        }
        out.push('\n');
    }
    out
}
