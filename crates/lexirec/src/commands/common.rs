//! Shared helpers for CLI commands.

use crate::DEFAULT_DB_NAME;
use anyhow::{Context, Result};
use lexirec_store::ContentStore;
use std::path::PathBuf;

/// Resolve the database path: explicit flag or the default file in the
/// current directory.
pub fn resolve_db_path(database: Option<PathBuf>) -> Result<PathBuf> {
    match database {
        Some(path) => Ok(path),
        None => {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            Ok(cwd.join(DEFAULT_DB_NAME))
        }
    }
}

/// Open a store that must already exist on disk.
pub fn open_existing(database: Option<PathBuf>) -> Result<ContentStore> {
    let db_path = resolve_db_path(database)?;
    if !db_path.exists() {
        anyhow::bail!(
            "Database not found: {:?}. Run 'lexirec seed' first.",
            db_path
        );
    }
    ContentStore::open(&db_path)
}
