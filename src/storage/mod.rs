//! Persistence: SQLite connection, migrations, and the two repositories.

pub mod backup;
pub mod database;
pub mod migrations;
pub mod options;
pub mod path_utils;
pub mod settings;
