//! Shared test utilities: migrated in-memory databases and a recording launcher.
//!
//! Available only under `#[cfg(test)]`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::autolaunch::AutoLauncher;
use crate::manager::SettingsManager;
use crate::storage::database::{self, SharedConnection};
use crate::storage::migrations;
use crate::{StoreError, StoreResult};

/// In-memory database with all migrations applied.
pub fn setup_db() -> Connection {
    let conn = database::open_in_memory().unwrap();
    migrations::run_migrations(&conn).unwrap();
    conn
}

/// Shared in-memory database with NO migrations (the manager runs them).
pub fn shared_db() -> SharedConnection {
    database::into_shared(database::open_in_memory().unwrap())
}

/// Initialized manager on a fresh database, plus a handle on its launcher.
pub fn ready_manager() -> (SettingsManager, RecordingLauncher) {
    let launcher = RecordingLauncher::new();
    let manager = SettingsManager::new(shared_db(), Box::new(launcher.clone()));
    manager.initialize().unwrap();
    (manager, launcher)
}

// ============================================================================
// RecordingLauncher
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchCall {
    Enable { hidden: bool },
    Disable,
}

/// Records every call. Clones share state, so a test can keep one handle
/// while the manager owns another.
#[derive(Clone, Default)]
pub struct RecordingLauncher {
    calls: Arc<Mutex<Vec<LaunchCall>>>,
    enabled: Arc<AtomicBool>,
    fail: bool,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every enable/disable call is recorded and then fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<LaunchCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: LaunchCall, enabled: bool) -> StoreResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            return Err(StoreError::Storage("autostart unavailable".into()));
        }
        self.enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}

impl AutoLauncher for RecordingLauncher {
    fn is_enabled(&self) -> StoreResult<bool> {
        Ok(self.enabled.load(Ordering::SeqCst))
    }

    fn enable(&self, hidden: bool) -> StoreResult<()> {
        self.record(LaunchCall::Enable { hidden }, true)
    }

    fn disable(&self) -> StoreResult<()> {
        self.record(LaunchCall::Disable, false)
    }
}
