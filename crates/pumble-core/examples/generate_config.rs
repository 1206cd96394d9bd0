//! Generate config.toml and config.schema.json into the workspace `config/` directory.
//!
//! Run with: cargo run -p pumble-core --example generate_config

use std::path::PathBuf;

use anyhow::Context;
use pumble_core::{APP_NAME, write_generated_files};

/// Repository URL for schema $id.
const REPO_URL: &str = "https://github.com/pumble-rs/pumble";

fn main() -> anyhow::Result<()> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")?;
    let crate_root = PathBuf::from(&manifest_dir);
    let workspace_root = crate_root
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .context("could not find workspace root")?;

    let config_dir = workspace_root.join("config");

    println!("Generating config files to {}...", config_dir.display());
    write_generated_files(&config_dir, APP_NAME, REPO_URL)?;
    println!("Done! Generated:");
    println!("  - {}/config.schema.json", config_dir.display());
    println!("  - {}/config.toml", config_dir.display());

    Ok(())
}
