use crate::constants::AUTO_BACKUP_PREFIX;
use crate::error::ValidationErrors;
use crate::settings::SettingsDocument;
use crate::time_utils;
use crate::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// JSON export/import of the settings document, plus rotating auto-backups.
pub struct SettingsBackup;

/// On-disk export format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsExport {
    pub exported_at: String,
    pub version: String,
    pub settings: SettingsDocument,
}

/// Info about an existing auto-backup file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupInfo {
    pub path: PathBuf,
    /// Millisecond stamp from the file name
    pub stamp: i64,
    pub size_bytes: u64,
}

impl SettingsBackup {
    /// Write `doc` with export metadata. Returns the written path.
    pub fn export_to_json(doc: &SettingsDocument, dest: &Path) -> StoreResult<PathBuf> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(dest, Self::render_export(doc)?)?;

        tracing::info!(dest = %dest.display(), "Settings exported");
        Ok(dest.to_path_buf())
    }

    fn render_export(doc: &SettingsDocument) -> StoreResult<String> {
        let export = SettingsExport {
            exported_at: time_utils::to_sqlite(&time_utils::now()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            settings: doc.clone(),
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Read an export file and return the settings candidate it carries.
    ///
    /// Accepts the wrapped export format or a bare document (object with a
    /// `theme` key). The candidate is NOT validated here: callers pass it to
    /// the normal save path.
    pub fn read_import(source: &Path) -> StoreResult<serde_json::Value> {
        if !source.exists() {
            return Err(StoreError::NotFound(format!(
                "Import file not found: {}",
                source.display()
            )));
        }

        let content = std::fs::read_to_string(source)?;
        let data: serde_json::Value = serde_json::from_str(&content)?;

        match data.get("settings") {
            Some(settings @ serde_json::Value::Object(_)) => return Ok(settings.clone()),
            Some(_) => {
                return Err(ValidationErrors::single("settings", "must be an object").into());
            }
            None => {}
        }
        if data.get("theme").is_some_and(|t| t.is_object()) {
            return Ok(data);
        }
        Err(ValidationErrors::single("", "Invalid settings file format").into())
    }

    /// Write `settings-auto-backup-<millis>.json` into `dir`.
    ///
    /// Never overwrites: if the stamp is taken (two backups in the same
    /// millisecond) the next free stamp is used.
    pub fn create_auto_backup(doc: &SettingsDocument, dir: &Path) -> StoreResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let content = Self::render_export(doc)?;

        let mut stamp = time_utils::now_millis();
        loop {
            let dest = dir.join(format!("{}{}.json", AUTO_BACKUP_PREFIX, stamp));
            match std::fs::OpenOptions::new().write(true).create_new(true).open(&dest) {
                Ok(mut file) => {
                    file.write_all(content.as_bytes())?;
                    tracing::info!(dest = %dest.display(), "Auto-backup written");
                    return Ok(dest);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => stamp += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Auto-backups in `dir`, newest first.
    pub fn list_auto_backups(dir: &Path) -> Vec<BackupInfo> {
        let mut backups = Vec::new();
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(_) => return backups,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let stamp = name
                .strip_prefix(AUTO_BACKUP_PREFIX)
                .and_then(|rest| rest.strip_suffix(".json"))
                .and_then(|millis| millis.parse::<i64>().ok());
            let Some(stamp) = stamp else {
                continue;
            };

            let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
            backups.push(BackupInfo {
                path,
                stamp,
                size_bytes,
            });
        }

        backups.sort_by(|a, b| b.stamp.cmp(&a.stamp)); // newest first
        backups
    }

    /// Keep the `keep` newest auto-backups, delete the rest. Returns how many were deleted.
    pub fn cleanup_old_backups(dir: &Path, keep: usize) -> usize {
        let backups = Self::list_auto_backups(dir);
        let mut deleted = 0;
        for backup in backups.iter().skip(keep) {
            if let Err(e) = std::fs::remove_file(&backup.path) {
                tracing::warn!(path = %backup.path.display(), error = %e, "Failed to delete old backup");
            } else {
                tracing::info!(path = %backup.path.display(), "Old backup deleted (retention)");
                deleted += 1;
            }
        }
        deleted
    }
}
