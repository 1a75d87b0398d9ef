//! SettingsManager: owns the cached settings document.
//!
//! Reads are served from an immutable `Arc` snapshot. Every write runs under
//! `write_lock`: repository call, cache refresh and side effects form one
//! critical section, so overlapping partial updates always merge against the
//! latest stored document.
//!
//! Listeners are notified after `write_lock` is released. Each committed
//! document is queued in commit order and a single dispatcher drains the
//! queue, so listeners see documents in the order they were stored even when
//! writes overlap, and a listener may itself write without deadlocking.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, TryLockError};

use rusqlite::Connection;
use serde_json::Value;

use crate::autolaunch::AutoLauncher;
use crate::listeners::{ListenerId, ListenerRegistry};
use crate::schema;
use crate::settings::{SettingsDocument, SettingsPatch};
use crate::side_effects;
use crate::storage::backup::SettingsBackup;
use crate::storage::database::{self, SharedConnection};
use crate::storage::migrations::{self, Migration, MIGRATIONS};
use crate::storage::settings::SettingsStorage;
use crate::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Uninitialized,
    Initializing,
    Ready,
}

pub struct SettingsManager {
    conn: SharedConnection,
    launcher: Box<dyn AutoLauncher>,
    migrations: &'static [Migration],
    init_lock: Mutex<()>,
    write_lock: Mutex<()>,
    state: RwLock<ManagerState>,
    cache: RwLock<Option<Arc<SettingsDocument>>>,
    listeners: ListenerRegistry,
    /// Committed documents waiting to be broadcast, oldest first.
    pending: Mutex<VecDeque<Arc<SettingsDocument>>>,
    dispatch_lock: Mutex<()>,
}

fn guard<'a>(lock: &'a Mutex<()>, what: &str) -> StoreResult<MutexGuard<'a, ()>> {
    lock.lock()
        .map_err(|e| StoreError::Storage(format!("{} lock poisoned: {}", what, e)))
}

impl SettingsManager {
    pub fn new(conn: SharedConnection, launcher: Box<dyn AutoLauncher>) -> Self {
        Self::with_migrations(conn, launcher, MIGRATIONS)
    }

    /// Same as `new` with an explicit migration list.
    pub fn with_migrations(
        conn: SharedConnection,
        launcher: Box<dyn AutoLauncher>,
        migrations: &'static [Migration],
    ) -> Self {
        Self {
            conn,
            launcher,
            migrations,
            init_lock: Mutex::new(()),
            write_lock: Mutex::new(()),
            state: RwLock::new(ManagerState::Uninitialized),
            cache: RwLock::new(None),
            listeners: ListenerRegistry::new(),
            pending: Mutex::new(VecDeque::new()),
            dispatch_lock: Mutex::new(()),
        }
    }

    pub fn state(&self) -> ManagerState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: ManagerState) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = state;
    }

    fn set_cache(&self, doc: Arc<SettingsDocument>) {
        *self.cache.write().unwrap_or_else(|e| e.into_inner()) = Some(doc);
    }

    fn pending(&self) -> MutexGuard<'_, VecDeque<Arc<SettingsDocument>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── Lifecycle ──

    /// Run migrations and load the settings into the cache.
    ///
    /// Idempotent. On failure the cache holds schema defaults and the manager
    /// is still `Ready`, but the error is returned to the caller.
    pub fn initialize(&self) -> StoreResult<()> {
        let _init = guard(&self.init_lock, "Init")?;
        if self.state() == ManagerState::Ready {
            return Ok(());
        }
        self.set_state(ManagerState::Initializing);

        let loaded = database::lock(&self.conn).and_then(|conn| {
            let ran = migrations::run_migration_list(&conn, self.migrations)?;
            if !ran.is_empty() {
                tracing::info!(count = ran.len(), "Migrations applied");
            }
            SettingsStorage::get_settings(&conn)
        });

        match loaded {
            Ok(doc) => {
                let doc = Arc::new(doc);
                self.set_cache(Arc::clone(&doc));
                self.set_state(ManagerState::Ready);
                tracing::info!("Settings manager ready");
                side_effects::reconcile(self.launcher.as_ref(), &doc);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Settings initialization failed, using defaults");
                self.set_cache(Arc::new(schema::defaults()));
                self.set_state(ManagerState::Ready);
                Err(e)
            }
        }
    }

    // ── Reads ──

    /// Current snapshot. Fails with `NotInitialized` before `initialize`.
    pub fn settings(&self) -> StoreResult<Arc<SettingsDocument>> {
        if self.state() != ManagerState::Ready {
            return Err(StoreError::NotInitialized);
        }
        self.cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(StoreError::NotInitialized)
    }

    // ── Writes ──

    /// Full replace. Missing fields take their defaults.
    pub fn save_settings(&self, candidate: &Value) -> StoreResult<Arc<SettingsDocument>> {
        self.commit("save", |conn| SettingsStorage::save_settings(conn, candidate))
    }

    /// Deep-merge a partial document over the stored one.
    pub fn update_settings(&self, patch: &Value) -> StoreResult<Arc<SettingsDocument>> {
        self.commit("update", |conn| SettingsStorage::update_settings(conn, patch))
    }

    pub fn apply_patch(&self, patch: &SettingsPatch) -> StoreResult<Arc<SettingsDocument>> {
        self.update_settings(&patch.to_value())
    }

    pub fn update_theme(&self, fields: Value) -> StoreResult<Arc<SettingsDocument>> {
        self.commit("update_theme", |conn| SettingsStorage::update_theme(conn, fields))
    }

    pub fn update_system(&self, fields: Value) -> StoreResult<Arc<SettingsDocument>> {
        self.commit("update_system", |conn| SettingsStorage::update_system(conn, fields))
    }

    pub fn update_updater(&self, fields: Value) -> StoreResult<Arc<SettingsDocument>> {
        self.commit("update_updater", |conn| SettingsStorage::update_updater(conn, fields))
    }

    pub fn reset_to_defaults(&self) -> StoreResult<Arc<SettingsDocument>> {
        self.commit("reset", SettingsStorage::reset_settings)
    }

    /// Re-read the stored document into the cache. No side effects, no notification.
    pub fn reload_settings(&self) -> StoreResult<Arc<SettingsDocument>> {
        let _write = guard(&self.write_lock, "Write")?;
        self.settings()?;
        let doc = {
            let conn = database::lock(&self.conn)?;
            Arc::new(SettingsStorage::get_settings(&conn)?)
        };
        self.set_cache(Arc::clone(&doc));
        tracing::debug!("Settings reloaded from storage");
        Ok(doc)
    }

    fn commit<F>(&self, op: &str, write: F) -> StoreResult<Arc<SettingsDocument>>
    where
        F: FnOnce(&Connection) -> StoreResult<SettingsDocument>,
    {
        let doc = {
            let _write = guard(&self.write_lock, "Write")?;
            let old = self.settings()?;

            let new = {
                let conn = database::lock(&self.conn)?;
                Arc::new(write(&conn)?)
            };
            self.set_cache(Arc::clone(&new));
            tracing::debug!(op = op, "Settings written");

            let effects = side_effects::diff(&old, &new);
            side_effects::apply(self.launcher.as_ref(), &effects);
            self.pending().push_back(Arc::clone(&new));
            new
        };

        self.dispatch_notifications();
        Ok(doc)
    }

    /// Broadcast queued documents in commit order.
    ///
    /// Only one thread dispatches at a time. A writer that finds the
    /// dispatcher busy (including a listener writing from inside a callback)
    /// leaves its document queued for the active dispatcher.
    fn dispatch_notifications(&self) {
        loop {
            let dispatching = match self.dispatch_lock.try_lock() {
                Ok(g) => g,
                Err(TryLockError::Poisoned(e)) => e.into_inner(),
                Err(TryLockError::WouldBlock) => return,
            };

            loop {
                let Some(doc) = self.pending().pop_front() else {
                    break;
                };
                self.listeners.broadcast(&doc.to_value());
            }
            drop(dispatching);

            // A writer may have queued between the last pop and the unlock
            if self.pending().is_empty() {
                return;
            }
        }
    }

    // ── Backup ──

    pub fn export_settings(&self, dest: &Path) -> StoreResult<PathBuf> {
        SettingsBackup::export_to_json(&*self.settings()?, dest)
    }

    /// Import through the normal save path (validation, side effects, notification).
    pub fn import_settings(&self, source: &Path) -> StoreResult<Arc<SettingsDocument>> {
        let candidate = SettingsBackup::read_import(source)?;
        let doc = self.save_settings(&candidate)?;
        tracing::info!(source = %source.display(), "Settings imported");
        Ok(doc)
    }

    /// Write an auto-backup into `dir` and prune to the `keep` newest.
    pub fn create_auto_backup(&self, dir: &Path, keep: usize) -> StoreResult<PathBuf> {
        let path = SettingsBackup::create_auto_backup(&*self.settings()?, dir)?;
        SettingsBackup::cleanup_old_backups(dir, keep);
        Ok(path)
    }

    // ── Listeners ──

    /// The callback gets its channel name and the JSON form of the new document.
    pub fn register_listener<F>(&self, channel: impl Into<String>, callback: F) -> ListenerId
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        self.listeners.register(channel, callback)
    }

    pub fn unregister_listener(&self, id: ListenerId) -> bool {
        self.listeners.unregister(id)
    }

    /// Send an arbitrary payload to one channel.
    pub fn emit(&self, channel: &str, payload: &Value) -> usize {
        self.listeners.emit(channel, payload)
    }
}
