use crate::constants::SETTINGS_ROW_ID;
use crate::schema::{self, FlatSettingsRecord, FIELDS};
use crate::settings::SettingsDocument;
use crate::time_utils;
use crate::validator;
use crate::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

/// The only reader/writer of the `settings` singleton row.
pub struct SettingsStorage;

/// The persisted singleton: flat fields plus identity and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsRow {
    pub id: i64,
    pub record: FlatSettingsRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SettingsRow {
    pub fn document(&self) -> SettingsDocument {
        schema::from_flat(&self.record)
    }
}

// ── Row mapping ──

fn timestamp_column(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let idx = row.as_ref().column_index(column)?;
    let raw: String = row.get(idx)?;
    time_utils::from_sqlite(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn settings_from_row(row: &Row) -> rusqlite::Result<SettingsRow> {
    Ok(SettingsRow {
        id: row.get("id")?,
        record: FlatSettingsRecord::from_row(row)?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

fn column_list() -> String {
    FIELDS.iter().map(|f| f.column).collect::<Vec<_>>().join(", ")
}

/// `INSERT INTO settings (id, <fields>, created_at, updated_at) VALUES (...) ON CONFLICT ...`
fn upsert_sql(on_conflict: &str) -> String {
    let placeholders: Vec<String> = (2..FIELDS.len() + 2).map(|i| format!("?{}", i)).collect();
    let ts = FIELDS.len() + 2;
    format!(
        "INSERT INTO settings (id, {}, created_at, updated_at) VALUES (?1, {}, ?{ts}, ?{ts}) {}",
        column_list(),
        placeholders.join(", "),
        on_conflict,
        ts = ts,
    )
}

fn write_row(conn: &Connection, record: &FlatSettingsRecord, replace: bool) -> StoreResult<usize> {
    let on_conflict = if replace {
        let sets: Vec<String> = FIELDS
            .iter()
            .map(|f| format!("{c} = excluded.{c}", c = f.column))
            .collect();
        format!(
            "ON CONFLICT(id) DO UPDATE SET {}, updated_at = excluded.updated_at",
            sets.join(", ")
        )
    } else {
        "ON CONFLICT(id) DO NOTHING".to_string()
    };

    let now = time_utils::to_sqlite(&time_utils::now());
    let mut values = vec![rusqlite::types::Value::Integer(SETTINGS_ROW_ID)];
    values.extend(record.columns().into_iter().map(|(_, v)| v));
    values.push(rusqlite::types::Value::Text(now));

    let changed = conn
        .execute(&upsert_sql(&on_conflict), params_from_iter(values))
        .map_err(|e| StoreError::Storage(format!("Write settings failed: {}", e)))?;
    Ok(changed)
}

// ── CRUD ──

impl SettingsStorage {
    /// The singleton row, if it has been created.
    pub fn find(conn: &Connection) -> StoreResult<Option<SettingsRow>> {
        let mut stmt = conn
            .prepare("SELECT * FROM settings WHERE id = ?1")
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let result = stmt
            .query_row([SETTINGS_ROW_ID], settings_from_row)
            .optional()
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(result)
    }

    pub fn count(conn: &Connection) -> StoreResult<usize> {
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM settings", [], |r| r.get(0))
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(count as usize)
    }

    /// Load-or-default. A missing row is created from schema defaults exactly once;
    /// the insert is a no-op if another caller created it first.
    pub fn get_settings(conn: &Connection) -> StoreResult<SettingsDocument> {
        if let Some(row) = Self::find(conn)? {
            return Ok(row.document());
        }

        let inserted = write_row(conn, &schema::to_flat(&schema::defaults()), false)?;
        if inserted > 0 {
            tracing::info!("Settings row created from defaults");
        }

        Self::find(conn)?
            .map(|row| row.document())
            .ok_or_else(|| StoreError::Storage("Settings row missing after insert".into()))
    }

    /// Insert or replace the singleton with an already-valid document.
    pub fn create_settings(conn: &Connection, doc: &SettingsDocument) -> StoreResult<SettingsDocument> {
        write_row(conn, &schema::to_flat(doc), true)?;
        tracing::debug!("Settings row written");
        Self::find(conn)?
            .map(|row| row.document())
            .ok_or_else(|| StoreError::Storage("Settings row missing after write".into()))
    }

    /// Full replace: validate the candidate (missing fields take defaults), then persist.
    pub fn save_settings(conn: &Connection, candidate: &serde_json::Value) -> StoreResult<SettingsDocument> {
        let validated = validator::validate(candidate)?;
        Self::create_settings(conn, &validated)
    }

    /// Deep-merge `patch` over the stored document, validate, persist, return the result.
    pub fn update_settings(conn: &Connection, patch: &serde_json::Value) -> StoreResult<SettingsDocument> {
        let current = Self::get_settings(conn)?;
        let merged = validator::merge(&current, patch)?;
        let validated = validator::validate(&merged)?;
        Self::create_settings(conn, &validated)
    }

    pub fn update_theme(conn: &Connection, fields: serde_json::Value) -> StoreResult<SettingsDocument> {
        Self::update_settings(conn, &serde_json::json!({ "theme": fields }))
    }

    pub fn update_system(conn: &Connection, fields: serde_json::Value) -> StoreResult<SettingsDocument> {
        Self::update_settings(conn, &serde_json::json!({ "system": fields }))
    }

    pub fn update_updater(conn: &Connection, fields: serde_json::Value) -> StoreResult<SettingsDocument> {
        Self::update_settings(conn, &serde_json::json!({ "updater": fields }))
    }

    /// Delete the singleton and recreate it from defaults, atomically.
    pub fn reset_settings(conn: &Connection) -> StoreResult<SettingsDocument> {
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        tx.execute("DELETE FROM settings", [])
            .map_err(|e| StoreError::Storage(format!("Reset settings failed: {}", e)))?;
        write_row(&tx, &schema::to_flat(&schema::defaults()), false)?;
        tx.commit()
            .map_err(|e| StoreError::Storage(format!("Reset settings failed: {}", e)))?;

        tracing::info!("Settings reset to defaults");
        Self::get_settings(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{DatesLocale, ThemeType};
    use crate::test_helpers::setup_db;
    use serde_json::json;

    #[test]
    fn test_get_settings_materializes_defaults_once() {
        let conn = setup_db();
        assert!(SettingsStorage::find(&conn).unwrap().is_none());

        let first = SettingsStorage::get_settings(&conn).unwrap();
        let second = SettingsStorage::get_settings(&conn).unwrap();

        assert_eq!(first, schema::defaults());
        assert_eq!(first, second);
        assert_eq!(SettingsStorage::count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_corrupt_timestamp_is_an_error() {
        let conn = setup_db();
        SettingsStorage::get_settings(&conn).unwrap();
        conn.execute("UPDATE settings SET updated_at = 'yesterday'", [])
            .unwrap();

        let err = SettingsStorage::find(&conn).unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
    }

    #[test]
    fn test_singleton_check_rejects_second_row() {
        let conn = setup_db();
        SettingsStorage::get_settings(&conn).unwrap();
        let result = conn.execute(
            "INSERT INTO settings (id, created_at, updated_at) VALUES (2, 'x', 'x')",
            [],
        );
        assert!(result.is_err());
        assert_eq!(SettingsStorage::count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_update_leaves_other_sections_identical() {
        let conn = setup_db();
        SettingsStorage::save_settings(
            &conn,
            &json!({
                "theme": {"type": "dark", "datesLocale": "us-US", "sidebarOpen": false},
                "updater": {"checkAutomatically": false, "installAutomatically": true}
            }),
        )
        .unwrap();
        let before = SettingsStorage::get_settings(&conn).unwrap();

        let after =
            SettingsStorage::update_settings(&conn, &json!({"system": {"startInTray": true}}))
                .unwrap();

        assert!(after.system.start_in_tray);
        assert_eq!(after.theme, before.theme);
        assert_eq!(after.updater, before.updater);
        assert_eq!(after.system.show_tray_icon, before.system.show_tray_icon);
        assert_eq!(SettingsStorage::get_settings(&conn).unwrap(), after);
    }

    #[test]
    fn test_invalid_save_leaves_row_unchanged() {
        let conn = setup_db();
        SettingsStorage::update_theme(&conn, json!({"type": "light"})).unwrap();
        let before = SettingsStorage::find(&conn).unwrap().unwrap();

        let err = SettingsStorage::save_settings(&conn, &json!({"theme": {"type": "purple"}}))
            .unwrap_err();
        assert!(err.validation_errors().unwrap().get("theme.type").is_some());

        let after = SettingsStorage::find(&conn).unwrap().unwrap();
        assert_eq!(after.record, before.record);
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[test]
    fn test_invalid_update_leaves_row_unchanged() {
        let conn = setup_db();
        let before = SettingsStorage::get_settings(&conn).unwrap();
        let err = SettingsStorage::update_system(&conn, json!({"showTrayIcon": "yes"})).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(SettingsStorage::get_settings(&conn).unwrap(), before);
    }

    #[test]
    fn test_save_is_full_replace() {
        let conn = setup_db();
        SettingsStorage::update_system(&conn, json!({"showTrayIcon": true})).unwrap();
        let saved = SettingsStorage::save_settings(&conn, &json!({"theme": {"type": "dark"}})).unwrap();
        assert_eq!(saved.theme.theme_type, ThemeType::Dark);
        assert!(!saved.system.show_tray_icon, "omitted fields fall back to defaults");
    }

    #[test]
    fn test_reset_restores_defaults() {
        let conn = setup_db();
        SettingsStorage::update_theme(&conn, json!({"datesLocale": "us-US"})).unwrap();
        let reset = SettingsStorage::reset_settings(&conn).unwrap();
        assert_eq!(reset, schema::defaults());
        assert_eq!(reset.theme.dates_locale, DatesLocale::NlNl);
        assert_eq!(SettingsStorage::count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_row_keeps_created_at_across_updates() {
        let conn = setup_db();
        SettingsStorage::get_settings(&conn).unwrap();
        let created = SettingsStorage::find(&conn).unwrap().unwrap();
        SettingsStorage::update_updater(&conn, json!({"downloadAutomatically": true})).unwrap();
        let updated = SettingsStorage::find(&conn).unwrap().unwrap();
        assert_eq!(updated.id, SETTINGS_ROW_ID);
        assert_eq!(created.created_at, updated.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn test_stored_columns_are_flat_names() {
        let conn = setup_db();
        SettingsStorage::update_theme(&conn, json!({"type": "dark"})).unwrap();
        let (theme, sidebar): (String, i64) = conn
            .query_row(
                "SELECT theme_type, theme_sidebar_open FROM settings WHERE id = 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(theme, "dark");
        assert_eq!(sidebar, 1);
    }

    #[test]
    fn test_missing_table_is_storage_error() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SettingsStorage::get_settings(&conn).unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
    }
}
