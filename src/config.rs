//! Store configuration, read from `{data_dir}/store_config.json`.
//!
//! Missing or invalid files fall back to defaults; values out of range are
//! clamped with a warning.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_BACKUP_RETENTION;
use crate::storage::path_utils;
use crate::StoreResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite file. Relative paths are resolved in the data dir.
    pub database_file: String,
    /// Name used for the autostart entry.
    pub app_name: String,
    /// When false the manager gets a no-op launcher.
    pub auto_launch_enabled: bool,
    /// Auto-backup directory. `None` means `{data_dir}/backups`.
    pub backup_dir: Option<String>,
    /// Auto-backups kept by cleanup.
    pub backup_retention: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_file: "settings.sqlite".to_string(),
            app_name: "settings-store".to_string(),
            auto_launch_enabled: true,
            backup_dir: None,
            backup_retention: DEFAULT_BACKUP_RETENTION,
        }
    }
}

impl StoreConfig {
    /// Load from `{data_dir}/store_config.json`.
    pub fn load() -> Self {
        Self::load_from(&path_utils::store_config_path())
    }

    /// Load from an explicit path. Returns defaults if the file is missing or invalid.
    pub fn load_from(path: &Path) -> Self {
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Invalid store config, using defaults"
                );
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        config.validate();
        config
    }

    /// Save to `{data_dir}/store_config.json`.
    pub fn save(&self) -> StoreResult<()> {
        self.save_to(&path_utils::store_config_path())
    }

    pub fn save_to(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        path_utils::resolve_in_data_dir(&self.database_file)
    }

    pub fn backup_dir(&self) -> PathBuf {
        match &self.backup_dir {
            Some(dir) => path_utils::resolve_in_data_dir(dir),
            None => path_utils::backups_dir(),
        }
    }

    fn validate(&mut self) {
        if self.database_file.trim().is_empty() {
            tracing::warn!(field = "database_file", "Empty, resetting to default");
            self.database_file = Self::default().database_file;
        }
        if self.app_name.trim().is_empty() {
            tracing::warn!(field = "app_name", "Empty, resetting to default");
            self.app_name = Self::default().app_name;
        }
        if self.backup_retention == 0 {
            tracing::warn!(field = "backup_retention", "Must be >= 1, using 1");
            self.backup_retention = 1;
        }
    }
}
