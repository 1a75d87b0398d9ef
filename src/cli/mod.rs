pub mod backup;
pub mod migrate;
pub mod options;
pub mod settings;

use anyhow::{Context, Result};
use settings_store::config::StoreConfig;
use settings_store::SettingsStore;

/// Store config with the `--db` override applied.
pub fn load_config(db: Option<&str>) -> StoreConfig {
    let mut config = StoreConfig::load();
    if let Some(path) = db {
        config.database_file = path.to_string();
    }
    // The CLI never touches the OS autostart registration.
    config.auto_launch_enabled = false;
    config
}

/// Open the store. An absorbed initialization error is reported as a warning.
pub fn open_store(db: Option<&str>) -> Result<SettingsStore> {
    let config = load_config(db);
    let path = config.database_path();
    let store = SettingsStore::open(config)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    if let Some(err) = store.startup_error() {
        eprintln!("Warning: settings fell back to defaults ({})", err);
    }
    Ok(store)
}
