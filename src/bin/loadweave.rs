//! loadweave: drive the load-time transformation orchestrator from the shell
//!
//! ## Features
//!
//! - **encode**: Turn a JSON unit tree into unit bytes
//! - **inspect**: Decode a unit and print its shape
//! - **transform**: Weave (or generate) one unit from a manifest
//! - **batch**: Transform a directory of units in parallel
//!
//! ## Example Usage
//!
//! ```bash
//! # Encode a unit
//! loadweave encode service.json -o app.Service.unit
//!
//! # Weave it using a manifest
//! loadweave transform --manifest weave.json --name app.Service \
//!     --input app.Service.unit -o woven/app.Service.unit
//!
//! # Generate a synthetic unit (no input)
//! loadweave transform --manifest weave.json --name 'app.Service$Args' -o args.unit
//!
//! # Transform a whole directory and show reload dependencies
//! loadweave batch --manifest weave.json --dir units/ --out-dir woven/ --json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod loadweave_cli;

use loadweave_cli::{
    batch::BatchCmd, encode::EncodeCmd, inspect::InspectCmd, transform::TransformCmd,
};

#[derive(Parser)]
#[command(
    name = "loadweave",
    author,
    version,
    about = "Load-time compiled-unit transformation orchestrator",
    long_about = "Encode, inspect, weave and generate compiled units through the loadweave \
                  orchestrator.\n\nLog verbosity follows RUST_LOG (default: info)."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Orchestrator configuration (JSON). LOADWEAVE_* variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON unit tree into unit bytes
    Encode(EncodeCmd),

    /// Decode a unit and print its shape
    Inspect(InspectCmd),

    /// Transform or generate one unit
    Transform(TransformCmd),

    /// Transform every *.unit file in a directory
    Batch(BatchCmd),
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let Cli {
        command,
        config,
        json,
    } = Cli::parse();

    match command {
        Commands::Encode(cmd) => cmd.execute(json),
        Commands::Inspect(cmd) => cmd.execute(json),
        Commands::Transform(cmd) => {
            let config = loadweave_cli::load_config(config.as_deref())?;
            cmd.execute(config, json)
        }
        Commands::Batch(cmd) => {
            let config = loadweave_cli::load_config(config.as_deref())?;
            cmd.execute(config, json)
        }
    }
}
