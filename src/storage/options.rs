use std::collections::BTreeMap;

use crate::constants::OPTION_KEY_MAX_LEN;
use crate::error::ValidationErrors;
use crate::time_utils;
use crate::{StoreError, StoreResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Storage for the open key/value `options` table.
///
/// Typed accessors are a codec over the text value: `"true"`/`"false"` for
/// booleans, decimal text for numbers. Unparsable values fall back to the
/// caller's default instead of failing.
pub struct OptionsStorage;

fn check_key(key: &str) -> StoreResult<()> {
    let len = key.chars().count();
    if len == 0 || len > OPTION_KEY_MAX_LEN {
        return Err(ValidationErrors::single(
            "key",
            format!("must be between 1 and {} characters", OPTION_KEY_MAX_LEN),
        )
        .into());
    }
    Ok(())
}

pub fn encode_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

pub fn decode_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

pub fn encode_number(value: f64) -> String {
    value.to_string()
}

pub fn decode_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

impl OptionsStorage {
    /// Raw lookup. `None` for a missing key or a NULL value.
    pub fn get(conn: &Connection, key: &str) -> StoreResult<Option<String>> {
        let value: Option<Option<String>> = conn
            .query_row(
                "SELECT value FROM options WHERE key = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional()
            .map_err(|e| StoreError::Storage(format!("Get option '{}' failed: {}", key, e)))?;
        Ok(value.flatten())
    }

    /// Lookup with auto-materialization: on a miss, `default` is written
    /// (insert-if-absent, never overwriting) and returned.
    pub fn get_or_init(conn: &Connection, key: &str, default: Option<&str>) -> StoreResult<Option<String>> {
        if let Some(value) = Self::get(conn, key)? {
            return Ok(Some(value));
        }
        let Some(default) = default else {
            return Ok(None);
        };

        check_key(key)?;
        let now = time_utils::to_sqlite(&time_utils::now());
        let inserted = conn
            .execute(
                "INSERT INTO options (key, value, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)
                 ON CONFLICT(key) DO NOTHING",
                params![key, default, now],
            )
            .map_err(|e| StoreError::Storage(format!("Init option '{}' failed: {}", key, e)))?;
        if inserted > 0 {
            tracing::debug!(key = key, "Option materialized from default");
            return Ok(Some(default.to_string()));
        }

        // Row exists with a NULL value: the default is the answer, and becomes the value.
        Self::set(conn, key, Some(default))?;
        Ok(Some(default.to_string()))
    }

    /// Atomic insert-or-update. Returns true once the value is stored.
    pub fn set(conn: &Connection, key: &str, value: Option<&str>) -> StoreResult<bool> {
        check_key(key)?;
        let now = time_utils::to_sqlite(&time_utils::now());
        conn.execute(
            "INSERT INTO options (key, value, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )
        .map_err(|e| StoreError::Storage(format!("Set option '{}' failed: {}", key, e)))?;
        tracing::debug!(key = key, "Option set");
        Ok(true)
    }

    /// Returns whether a row was removed.
    pub fn delete(conn: &Connection, key: &str) -> StoreResult<bool> {
        let deleted = conn
            .execute("DELETE FROM options WHERE key = ?1", params![key])
            .map_err(|e| StoreError::Storage(format!("Delete option '{}' failed: {}", key, e)))?;
        Ok(deleted > 0)
    }

    pub fn has(conn: &Connection, key: &str) -> StoreResult<bool> {
        let exists: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM options WHERE key = ?1",
                params![key],
                |r| r.get(0),
            )
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(exists)
    }

    /// Every option with a non-NULL value, sorted by key.
    pub fn get_all(conn: &Connection) -> StoreResult<BTreeMap<String, String>> {
        let mut stmt = conn
            .prepare("SELECT key, value FROM options WHERE value IS NOT NULL ORDER BY key")
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let rows = stmt
            .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let mut all = BTreeMap::new();
        for row in rows {
            let (key, value) = row.map_err(|e| StoreError::Storage(e.to_string()))?;
            all.insert(key, value);
        }
        Ok(all)
    }

    pub fn get_bool(conn: &Connection, key: &str, default: bool) -> StoreResult<bool> {
        let raw = Self::get_or_init(conn, key, Some(encode_bool(default)))?;
        Ok(raw.as_deref().and_then(decode_bool).unwrap_or(default))
    }

    pub fn set_bool(conn: &Connection, key: &str, value: bool) -> StoreResult<bool> {
        Self::set(conn, key, Some(encode_bool(value)))
    }

    pub fn get_number(conn: &Connection, key: &str, default: f64) -> StoreResult<f64> {
        let raw = Self::get_or_init(conn, key, Some(&encode_number(default)))?;
        Ok(raw.as_deref().and_then(decode_number).unwrap_or(default))
    }

    pub fn set_number(conn: &Connection, key: &str, value: f64) -> StoreResult<bool> {
        if !value.is_finite() {
            return Err(ValidationErrors::single("value", "must be a finite number").into());
        }
        Self::set(conn, key, Some(&encode_number(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::setup_db;

    #[test]
    fn test_get_missing_without_default_does_not_write() {
        let conn = setup_db();
        assert_eq!(OptionsStorage::get_or_init(&conn, "absent", None).unwrap(), None);
        assert!(!OptionsStorage::has(&conn, "absent").unwrap());
    }

    #[test]
    fn test_get_with_default_materializes() {
        let conn = setup_db();
        let value = OptionsStorage::get_or_init(&conn, "lastTab", Some("home")).unwrap();
        assert_eq!(value.as_deref(), Some("home"));
        assert!(OptionsStorage::has(&conn, "lastTab").unwrap());

        // A later default does not overwrite the materialized value
        let again = OptionsStorage::get_or_init(&conn, "lastTab", Some("settings")).unwrap();
        assert_eq!(again.as_deref(), Some("home"));
    }

    #[test]
    fn test_set_is_upsert() {
        let conn = setup_db();
        assert!(OptionsStorage::set(&conn, "k", Some("one")).unwrap());
        assert!(OptionsStorage::set(&conn, "k", Some("two")).unwrap());
        assert_eq!(OptionsStorage::get(&conn, "k").unwrap().as_deref(), Some("two"));
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM options WHERE key = 'k'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_delete_reports_removal() {
        let conn = setup_db();
        OptionsStorage::set(&conn, "k", Some("v")).unwrap();
        assert!(OptionsStorage::delete(&conn, "k").unwrap());
        assert!(!OptionsStorage::delete(&conn, "k").unwrap());
        assert!(!OptionsStorage::has(&conn, "k").unwrap());
    }

    #[test]
    fn test_get_all_skips_null_values() {
        let conn = setup_db();
        OptionsStorage::set(&conn, "b", Some("2")).unwrap();
        OptionsStorage::set(&conn, "a", Some("1")).unwrap();
        OptionsStorage::set(&conn, "nothing", None).unwrap();
        let all = OptionsStorage::get_all(&conn).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(OptionsStorage::has(&conn, "nothing").unwrap());
    }

    #[test]
    fn test_null_value_takes_default_on_read() {
        let conn = setup_db();
        OptionsStorage::set(&conn, "n", None).unwrap();
        assert_eq!(OptionsStorage::get(&conn, "n").unwrap(), None);
        let value = OptionsStorage::get_or_init(&conn, "n", Some("d")).unwrap();
        assert_eq!(value.as_deref(), Some("d"));
        assert_eq!(OptionsStorage::get(&conn, "n").unwrap().as_deref(), Some("d"));
    }

    #[test]
    fn test_get_bool_materializes_default() {
        let conn = setup_db();
        assert!(OptionsStorage::get_bool(&conn, "flag", true).unwrap());
        assert!(OptionsStorage::has(&conn, "flag").unwrap());
        assert_eq!(OptionsStorage::get(&conn, "flag").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn test_get_bool_parse_failure_falls_back() {
        let conn = setup_db();
        OptionsStorage::set(&conn, "flag", Some("maybe")).unwrap();
        assert!(OptionsStorage::get_bool(&conn, "flag", true).unwrap());
        assert!(!OptionsStorage::get_bool(&conn, "flag", false).unwrap());
        OptionsStorage::set(&conn, "flag", Some("TRUE")).unwrap();
        assert!(OptionsStorage::get_bool(&conn, "flag", false).unwrap());
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn test_number_roundtrip_uses_decimal_text() {
        let conn = setup_db();
        OptionsStorage::set_number(&conn, "x", 3.14).unwrap();
        assert_eq!(OptionsStorage::get_number(&conn, "x", 0.0).unwrap(), 3.14);
        assert_eq!(OptionsStorage::get(&conn, "x").unwrap().as_deref(), Some("3.14"));

        OptionsStorage::set_number(&conn, "whole", 3.0).unwrap();
        assert_eq!(OptionsStorage::get(&conn, "whole").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn test_get_number_parse_failure_falls_back() {
        let conn = setup_db();
        OptionsStorage::set(&conn, "x", Some("abc")).unwrap();
        assert_eq!(OptionsStorage::get_number(&conn, "x", 7.5).unwrap(), 7.5);
        OptionsStorage::set(&conn, "nan", Some("NaN")).unwrap();
        assert_eq!(OptionsStorage::get_number(&conn, "nan", 1.0).unwrap(), 1.0);
        for raw in ["inf", "-infinity", "Infinity"] {
            OptionsStorage::set(&conn, "inf", Some(raw)).unwrap();
            assert_eq!(OptionsStorage::get_number(&conn, "inf", 2.0).unwrap(), 2.0);
        }
    }

    #[test]
    fn test_set_number_rejects_non_finite() {
        let conn = setup_db();
        assert!(OptionsStorage::set_number(&conn, "x", f64::INFINITY).is_err());
        assert!(!OptionsStorage::has(&conn, "x").unwrap());
    }

    #[test]
    fn test_key_length_is_validated() {
        let conn = setup_db();
        let err = OptionsStorage::set(&conn, "", Some("v")).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        let long = "k".repeat(OPTION_KEY_MAX_LEN + 1);
        assert!(OptionsStorage::set(&conn, &long, Some("v")).is_err());
        let max = "k".repeat(OPTION_KEY_MAX_LEN);
        assert!(OptionsStorage::set(&conn, &max, Some("v")).unwrap());
    }

    #[test]
    fn test_codec_helpers() {
        assert_eq!(decode_bool(" False "), Some(false));
        assert_eq!(decode_bool("1"), None);
        assert_eq!(decode_number("2.5e1"), Some(25.0));
        assert_eq!(decode_number("inf"), None);
        assert_eq!(encode_number(-0.5), "-0.5");
    }
}
