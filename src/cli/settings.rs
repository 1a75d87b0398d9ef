use anyhow::{bail, Result};
use serde_json::Value;
use settings_store::schema;

use super::open_store;

/// `settings show`: print the full document.
pub fn run_show(db: Option<&str>) -> Result<()> {
    let store = open_store(db)?;
    let doc = store.settings.settings()?;
    println!("{}", serde_json::to_string_pretty(&doc.to_value())?);
    Ok(())
}

/// `settings get <section.field>`: print one value.
pub fn run_get(db: Option<&str>, key: &str) -> Result<()> {
    let store = open_store(db)?;
    let doc = store.settings.settings()?.to_value();

    match resolve_path(&doc, key) {
        Some(v) => println!("{}", serde_json::to_string_pretty(v)?),
        None => bail!("Key not found: {}", key),
    }
    Ok(())
}

/// `settings set <section.field> <value>`: validated partial update.
///
/// Value is parsed as JSON, falling back to a plain string.
pub fn run_set(db: Option<&str>, key: &str, value: &str) -> Result<()> {
    let Some((section, field)) = key.split_once('.') else {
        bail!("Expected <section>.<field>, got '{}'", key);
    };
    if schema::find_field(section, field).is_none() {
        bail!("Unknown setting: {}", key);
    }

    let parsed: Value = serde_json::from_str(value).unwrap_or(Value::String(value.to_string()));
    let mut fields = serde_json::Map::new();
    fields.insert(field.to_string(), parsed.clone());
    let mut patch = serde_json::Map::new();
    patch.insert(section.to_string(), Value::Object(fields));

    let store = open_store(db)?;
    store.settings.update_settings(&Value::Object(patch))?;
    println!("{} = {}", key, serde_json::to_string(&parsed)?);
    Ok(())
}

/// `settings reset`
pub fn run_reset(db: Option<&str>) -> Result<()> {
    let store = open_store(db)?;
    let doc = store.settings.reset_to_defaults()?;
    println!("{}", serde_json::to_string_pretty(&doc.to_value())?);
    Ok(())
}

/// Resolve a dot-separated path in a JSON value.
fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}
