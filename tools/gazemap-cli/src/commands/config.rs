//! Show or persist the effective configuration.

use std::path::PathBuf;

use gazemap_common::config::{config_file_path, AppConfig};

pub fn run(config: &AppConfig, explicit_path: Option<PathBuf>, write: bool) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);

    if write {
        let path = explicit_path.unwrap_or_else(config_file_path);
        config.save_to(&path)?;
        tracing::info!(path = %path.display(), "configuration written");
        println!("\nWritten to: {}", path.display());
    }
    Ok(())
}
