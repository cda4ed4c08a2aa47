pub mod backlog;
pub mod devices;
pub mod run;

use anyhow::{Context, Result};
use cardrelay_core::RelayConfig;
use std::path::{Path, PathBuf};

/// Load the parameter file, applying a `--database` override.
pub fn load_config(path: &Path, database: Option<PathBuf>) -> Result<RelayConfig> {
    let mut config = RelayConfig::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    if let Some(database) = database {
        config.database_path = database;
    }
    Ok(config)
}
