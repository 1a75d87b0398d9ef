//! Forward-only schema migrations with a name ledger.
//!
//! Each step runs in its own transaction together with its ledger insert, so
//! a failing step leaves both the schema and `schema_migrations` as they were.
//! DDL here is frozen per release: later fields get a new step, old steps are
//! never edited.

use crate::{StoreError, StoreResult};
use rusqlite::{params, Connection, OptionalExtension};

pub type MigrationFn = fn(&Connection) -> rusqlite::Result<()>;

#[derive(Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub up: MigrationFn,
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration").field("name", &self.name).finish()
    }
}

/// Declared order. Append only.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "001_create_settings",
        up: create_settings,
    },
    Migration {
        name: "002_add_startup_settings",
        up: add_startup_settings,
    },
    Migration {
        name: "003_create_options",
        up: create_options,
    },
];

const LEDGER_DDL: &str = "
CREATE TABLE IF NOT EXISTS schema_migrations (
    name TEXT PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
";

// ── Steps ──

const SETTINGS_V1: &str = "
CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    theme_type TEXT NOT NULL DEFAULT 'system' CHECK (theme_type IN ('light', 'dark', 'system')),
    theme_dates_locale TEXT NOT NULL DEFAULT 'nl-NL' CHECK (theme_dates_locale IN ('nl-NL', 'us-US')),
    theme_sidebar_open BOOLEAN NOT NULL DEFAULT 1,
    system_show_tray_icon BOOLEAN NOT NULL DEFAULT 0,
    system_minimize_to_tray BOOLEAN NOT NULL DEFAULT 0,
    updater_check_automatically BOOLEAN NOT NULL DEFAULT 1,
    updater_download_automatically BOOLEAN NOT NULL DEFAULT 0,
    updater_install_automatically BOOLEAN NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

fn create_settings(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SETTINGS_V1)
}

fn add_startup_settings(conn: &Connection) -> rusqlite::Result<()> {
    // Additive and re-runnable: a column left over from an interrupted run is skipped.
    for column in ["system_start_in_tray", "system_start_with_system"] {
        if !column_exists(conn, "settings", column)? {
            conn.execute_batch(&format!(
                "ALTER TABLE settings ADD COLUMN {} BOOLEAN NOT NULL DEFAULT 0;",
                column
            ))?;
        }
    }
    Ok(())
}

const OPTIONS_V1: &str = "
CREATE TABLE IF NOT EXISTS options (
    key TEXT PRIMARY KEY CHECK (length(key) BETWEEN 1 AND 255),
    value TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

fn create_options(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(OPTIONS_V1)
}

// ── Runner ──

pub fn column_exists(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |r| r.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn ensure_ledger(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(LEDGER_DDL)
        .map_err(|e| StoreError::Storage(format!("Failed to create migration ledger: {}", e)))?;
    Ok(())
}

/// Ledger names in application order (empty if the ledger does not exist yet).
pub fn applied_migrations(conn: &Connection) -> StoreResult<Vec<String>> {
    let exists: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type='table' AND name='schema_migrations'",
            [],
            |r| r.get(0),
        )
        .optional()
        .map_err(|e| StoreError::Storage(e.to_string()))?;
    if exists.is_none() {
        return Ok(Vec::new());
    }

    let mut stmt = conn
        .prepare("SELECT name FROM schema_migrations ORDER BY rowid")
        .map_err(|e| StoreError::Storage(e.to_string()))?;
    let rows = stmt
        .query_map([], |r| r.get::<_, String>(0))
        .map_err(|e| StoreError::Storage(e.to_string()))?;

    let mut names = Vec::new();
    for row in rows {
        names.push(row.map_err(|e| StoreError::Storage(e.to_string()))?);
    }
    Ok(names)
}

/// Apply every pending migration of `MIGRATIONS`. Returns the names applied now.
pub fn run_migrations(conn: &Connection) -> StoreResult<Vec<&'static str>> {
    run_migration_list(conn, MIGRATIONS)
}

/// Apply pending steps of `migrations` in order; the first failure aborts the run.
pub fn run_migration_list(
    conn: &Connection,
    migrations: &[Migration],
) -> StoreResult<Vec<&'static str>> {
    ensure_ledger(conn)?;
    let applied = applied_migrations(conn)?;

    let mut ran = Vec::new();
    for migration in migrations {
        if applied.iter().any(|name| name == migration.name) {
            continue;
        }

        tracing::info!(migration = migration.name, "Running migration");
        apply_one(conn, migration).map_err(|e| {
            tracing::error!(migration = migration.name, error = %e, "Migration failed");
            StoreError::MigrationFailed {
                name: migration.name.to_string(),
                reason: e.to_string(),
            }
        })?;
        tracing::info!(migration = migration.name, "Migration completed");
        ran.push(migration.name);
    }

    Ok(ran)
}

fn apply_one(conn: &Connection, migration: &Migration) -> rusqlite::Result<()> {
    let tx = conn.unchecked_transaction()?;
    (migration.up)(&tx)?;
    tx.execute(
        "INSERT INTO schema_migrations (name, applied_at) VALUES (?1, datetime('now'))",
        params![migration.name],
    )?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FIELDS;

    fn table_exists(conn: &Connection, table: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
            params![table],
            |r| r.get(0),
        )
        .unwrap()
    }

    fn fresh() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_runs_all_in_declared_order() {
        let conn = fresh();
        let ran = run_migrations(&conn).unwrap();
        assert_eq!(
            ran,
            vec!["001_create_settings", "002_add_startup_settings", "003_create_options"]
        );
        assert_eq!(applied_migrations(&conn).unwrap(), ran);
        assert!(table_exists(&conn, "settings"));
        assert!(table_exists(&conn, "options"));
    }

    #[test]
    fn test_second_run_is_noop() {
        let conn = fresh();
        run_migrations(&conn).unwrap();
        let before = applied_migrations(&conn).unwrap();

        let ran = run_migrations(&conn).unwrap();
        assert!(ran.is_empty());
        assert_eq!(applied_migrations(&conn).unwrap(), before);
    }

    #[test]
    fn test_settings_table_has_every_schema_column() {
        let conn = fresh();
        run_migrations(&conn).unwrap();
        for field in FIELDS {
            assert!(
                column_exists(&conn, "settings", field.column).unwrap(),
                "column {} missing after migrations",
                field.column
            );
        }
    }

    #[test]
    fn test_upgrade_from_first_release_keeps_row() {
        let conn = fresh();
        run_migration_list(&conn, &MIGRATIONS[..1]).unwrap();
        conn.execute(
            "INSERT INTO settings (id, theme_type, created_at, updated_at)
             VALUES (1, 'dark', datetime('now'), datetime('now'))",
            [],
        )
        .unwrap();

        let ran = run_migrations(&conn).unwrap();
        assert_eq!(ran, vec!["002_add_startup_settings", "003_create_options"]);

        let (theme, start_in_tray): (String, bool) = conn
            .query_row(
                "SELECT theme_type, system_start_in_tray FROM settings WHERE id = 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(theme, "dark");
        assert!(!start_in_tray);
    }

    #[test]
    fn test_step_tolerates_columns_from_unrecorded_run() {
        // Step 002 succeeded earlier but its ledger insert was lost.
        let conn = fresh();
        run_migrations(&conn).unwrap();
        conn.execute(
            "DELETE FROM schema_migrations WHERE name = '002_add_startup_settings'",
            [],
        )
        .unwrap();

        let ran = run_migrations(&conn).unwrap();
        assert_eq!(ran, vec!["002_add_startup_settings"]);
    }

    fn failing_step(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch("CREATE TABLE half_done (id INTEGER);")?;
        conn.execute_batch("THIS IS NOT SQL;")
    }

    fn later_step(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch("CREATE TABLE later (id INTEGER);")
    }

    #[test]
    fn test_failed_step_rolls_back_and_aborts() {
        let conn = fresh();
        let list = [
            MIGRATIONS[0],
            Migration {
                name: "002_broken",
                up: failing_step,
            },
            Migration {
                name: "003_later",
                up: later_step,
            },
        ];

        let err = run_migration_list(&conn, &list).unwrap_err();
        match err {
            StoreError::MigrationFailed { name, .. } => assert_eq!(name, "002_broken"),
            other => panic!("expected MigrationFailed, got {:?}", other),
        }

        assert_eq!(applied_migrations(&conn).unwrap(), vec!["001_create_settings"]);
        assert!(!table_exists(&conn, "half_done"), "partial step must roll back");
        assert!(!table_exists(&conn, "later"), "later steps must not run");
    }

    #[test]
    fn test_ledger_creation_tolerates_existing_table() {
        let conn = fresh();
        ensure_ledger(&conn).unwrap();
        ensure_ledger(&conn).unwrap();
        assert!(applied_migrations(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_applied_migrations_without_ledger() {
        let conn = fresh();
        assert!(applied_migrations(&conn).unwrap().is_empty());
    }
}
