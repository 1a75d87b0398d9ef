//! Entry point wiring config, connection, manager and options together.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
use crate::autolaunch::DesktopEntryLauncher;
use crate::autolaunch::{AutoLauncher, NoopLauncher};
use crate::config::StoreConfig;
use crate::manager::SettingsManager;
use crate::options::Options;
use crate::storage::database::{self, SharedConnection};
use crate::StoreResult;

pub struct SettingsStore {
    pub config: StoreConfig,
    pub settings: SettingsManager,
    pub options: Options,
    /// Initialization error absorbed at open (settings fell back to defaults).
    startup_error: Option<String>,
}

impl SettingsStore {
    /// Open the database named by `config` and initialize the manager.
    ///
    /// Only a connection failure is an error here. A failed initialization
    /// leaves the store usable with default settings; see `startup_error`.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let conn = database::into_shared(database::open_connection(&config.database_path())?);
        let launcher = platform_launcher(&config);
        Ok(Self::open_with(config, conn, launcher))
    }

    pub fn open_with(config: StoreConfig, conn: SharedConnection, launcher: Box<dyn AutoLauncher>) -> Self {
        let settings = SettingsManager::new(conn.clone(), launcher);
        let startup_error = settings.initialize().err().map(|e| e.to_string());
        Self {
            config,
            settings,
            options: Options::new(conn),
            startup_error,
        }
    }

    pub fn startup_error(&self) -> Option<&str> {
        self.startup_error.as_deref()
    }

    /// Auto-backup into the configured dir with the configured retention.
    pub fn auto_backup(&self) -> StoreResult<PathBuf> {
        self.settings
            .create_auto_backup(&self.config.backup_dir(), self.config.backup_retention)
    }
}

fn platform_launcher(config: &StoreConfig) -> Box<dyn AutoLauncher> {
    if !config.auto_launch_enabled {
        return Box::new(NoopLauncher);
    }
    login_launcher(config)
}

/// XDG autostart entry.
#[cfg(target_os = "linux")]
fn login_launcher(config: &StoreConfig) -> Box<dyn AutoLauncher> {
    Box::new(DesktopEntryLauncher::for_current_exe(config.app_name.clone()))
}

/// No registration backend on this platform yet.
#[cfg(not(target_os = "linux"))]
fn login_launcher(_config: &StoreConfig) -> Box<dyn AutoLauncher> {
    tracing::warn!(
        os = std::env::consts::OS,
        "Launch at login is not supported on this platform, startWithSystem has no effect"
    );
    Box::new(NoopLauncher)
}
