//! Backlog command implementation

use anyhow::{Context, Result};
use cardrelay_storage::{
    Database, DatabaseConfig, PersistedScan, ScanRepository, SqliteScanRepository,
};
use futures::TryStreamExt;
use std::path::PathBuf;

pub async fn execute(config_path: PathBuf, database: Option<PathBuf>, list: bool) -> Result<()> {
    // The database alone is enough when given explicitly.
    let database_path = match database {
        Some(path) => path,
        None => super::load_config(&config_path, None)?.database_path,
    };
    tracing::info!("Reading backlog: {}", database_path.display());

    let config = DatabaseConfig::new(&database_path).create_if_missing(false);
    let db = Database::new(config)
        .await
        .with_context(|| format!("Failed to open database {}", database_path.display()))?;
    let repo = SqliteScanRepository::new(db.pool().clone());

    let count = repo.count().await.context("Failed to count backlog")?;
    println!("{} scan(s) awaiting delivery", count);

    if list {
        let rows: Vec<PersistedScan> = repo
            .all()
            .try_collect()
            .await
            .context("Failed to read backlog")?;
        for row in &rows {
            println!("{}", serde_json::to_string(row)?);
        }
    }

    db.close().await;
    Ok(())
}
