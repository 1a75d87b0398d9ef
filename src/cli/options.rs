use anyhow::Result;

use super::open_store;

pub fn run_get(db: Option<&str>, key: &str, default: Option<&str>) -> Result<()> {
    let store = open_store(db)?;
    match store.options.get(key, default)? {
        Some(value) => println!("{}", value),
        None => println!("(not set)"),
    }
    Ok(())
}

pub fn run_set(db: Option<&str>, key: &str, value: &str) -> Result<()> {
    let store = open_store(db)?;
    store.options.set(key, Some(value))?;
    println!("{} = {}", key, value);
    Ok(())
}

pub fn run_delete(db: Option<&str>, key: &str) -> Result<()> {
    let store = open_store(db)?;
    if store.options.delete(key)? {
        println!("Deleted {}", key);
    } else {
        println!("No option named {}", key);
    }
    Ok(())
}

pub fn run_has(db: Option<&str>, key: &str) -> Result<()> {
    let store = open_store(db)?;
    println!("{}", store.options.has(key)?);
    Ok(())
}

/// `options list`: one `key = value` per line, sorted by key.
pub fn run_list(db: Option<&str>) -> Result<()> {
    let store = open_store(db)?;
    let all = store.options.get_all()?;
    if all.is_empty() {
        println!("No options stored.");
        return Ok(());
    }
    let width = all.keys().map(|k| k.len()).max().unwrap_or(0);
    for (key, value) in &all {
        println!("{:<width$} = {}", key, value, width = width);
    }
    Ok(())
}

pub fn run_get_bool(db: Option<&str>, key: &str, default: bool) -> Result<()> {
    let store = open_store(db)?;
    println!("{}", store.options.get_bool(key, default)?);
    Ok(())
}

pub fn run_set_bool(db: Option<&str>, key: &str, value: bool) -> Result<()> {
    let store = open_store(db)?;
    store.options.set_bool(key, value)?;
    println!("{} = {}", key, value);
    Ok(())
}

pub fn run_get_number(db: Option<&str>, key: &str, default: f64) -> Result<()> {
    let store = open_store(db)?;
    println!("{}", store.options.get_number(key, default)?);
    Ok(())
}

pub fn run_set_number(db: Option<&str>, key: &str, value: f64) -> Result<()> {
    let store = open_store(db)?;
    store.options.set_number(key, value)?;
    println!("{} = {}", key, value);
    Ok(())
}
