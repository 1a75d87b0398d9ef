//! Typed options facade over `OptionsStorage` and the shared connection.

use std::collections::BTreeMap;

use crate::storage::database::{self, SharedConnection};
use crate::storage::options::OptionsStorage;
use crate::StoreResult;

#[derive(Clone)]
pub struct Options {
    conn: SharedConnection,
}

impl Options {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// With `Some(default)`, a missing key is written with the default first.
    pub fn get(&self, key: &str, default: Option<&str>) -> StoreResult<Option<String>> {
        let conn = database::lock(&self.conn)?;
        OptionsStorage::get_or_init(&conn, key, default)
    }

    pub fn set(&self, key: &str, value: Option<&str>) -> StoreResult<bool> {
        let conn = database::lock(&self.conn)?;
        OptionsStorage::set(&conn, key, value)
    }

    pub fn delete(&self, key: &str) -> StoreResult<bool> {
        let conn = database::lock(&self.conn)?;
        OptionsStorage::delete(&conn, key)
    }

    pub fn has(&self, key: &str) -> StoreResult<bool> {
        let conn = database::lock(&self.conn)?;
        OptionsStorage::has(&conn, key)
    }

    pub fn get_all(&self) -> StoreResult<BTreeMap<String, String>> {
        let conn = database::lock(&self.conn)?;
        OptionsStorage::get_all(&conn)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> StoreResult<bool> {
        let conn = database::lock(&self.conn)?;
        OptionsStorage::get_bool(&conn, key, default)
    }

    pub fn set_bool(&self, key: &str, value: bool) -> StoreResult<bool> {
        let conn = database::lock(&self.conn)?;
        OptionsStorage::set_bool(&conn, key, value)
    }

    pub fn get_number(&self, key: &str, default: f64) -> StoreResult<f64> {
        let conn = database::lock(&self.conn)?;
        OptionsStorage::get_number(&conn, key, default)
    }

    pub fn set_number(&self, key: &str, value: f64) -> StoreResult<bool> {
        let conn = database::lock(&self.conn)?;
        OptionsStorage::set_number(&conn, key, value)
    }
}
