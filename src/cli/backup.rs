use anyhow::{Context, Result};
use std::path::PathBuf;

use settings_store::storage::path_utils;
use settings_store::time_utils;

use super::open_store;

/// `backup export [path]`: defaults to `{backup_dir}/settings-export-<millis>.json`.
pub fn run_export(db: Option<&str>, path: Option<&str>) -> Result<()> {
    let store = open_store(db)?;
    let dest = match path {
        Some(p) => PathBuf::from(path_utils::expand_tilde(p)),
        None => store
            .config
            .backup_dir()
            .join(format!("settings-export-{}.json", time_utils::now_millis())),
    };
    let written = store
        .settings
        .export_settings(&dest)
        .with_context(|| format!("Failed to export to {}", dest.display()))?;
    println!("Exported to {}", written.display());
    Ok(())
}

/// `backup import <path>`: goes through validation like any save.
pub fn run_import(db: Option<&str>, path: &str) -> Result<()> {
    let store = open_store(db)?;
    let source = PathBuf::from(path_utils::expand_tilde(path));
    let doc = store
        .settings
        .import_settings(&source)
        .with_context(|| format!("Failed to import {}", source.display()))?;
    println!("{}", serde_json::to_string_pretty(&doc.to_value())?);
    Ok(())
}

/// `backup auto`
pub fn run_auto(db: Option<&str>) -> Result<()> {
    let store = open_store(db)?;
    let path = store.auto_backup()?;
    println!(
        "Backup written to {} (keeping {} newest)",
        path.display(),
        store.config.backup_retention
    );
    Ok(())
}
