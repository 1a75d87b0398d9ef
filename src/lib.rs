//! Settings Store: local, schema-driven settings and options for a desktop app.
//!
//! Single-crate library: a validated settings document cached by
//! `SettingsManager`, a key/value options table behind `Options`, both backed
//! by one migrated SQLite database.

// Foundation
pub mod constants;
pub mod error;
pub mod time_utils;

// Schema and validation
pub mod schema;
pub mod settings;
pub mod validator;

// Sub-systems
pub mod storage;
pub mod autolaunch;
pub mod side_effects;
pub mod listeners;
pub mod manager;
pub mod options;
pub mod store;
pub mod config;
pub mod tracing_init;

#[cfg(test)]
pub mod test_helpers;

// Re-exports for convenience
pub use error::{StoreError, StoreResult, ValidationErrors};
pub use manager::{ManagerState, SettingsManager};
pub use options::Options;
pub use settings::{SettingsDocument, SettingsPatch};
pub use store::SettingsStore;
