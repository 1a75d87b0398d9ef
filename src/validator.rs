//! Turns a candidate JSON document (full or partial) into a
//! complete `SettingsDocument`, or reports every invalid field at once.
//!
//! Rules:
//! - unknown sections and fields are stripped
//! - missing sections and fields take the schema default
//! - booleans and strings must already have the right JSON type (no coercion)
//! - enum fields must hold one of the declared values

use serde_json::{Map, Value};

use crate::error::{StoreResult, ValidationErrors};
use crate::schema::{self, FieldKind, SECTIONS};
use crate::settings::SettingsDocument;

fn check_field(kind: FieldKind, value: &Value) -> Result<(), String> {
    match kind {
        FieldKind::Bool => match value {
            Value::Bool(_) => Ok(()),
            _ => Err("must be a boolean".to_string()),
        },
        FieldKind::Text => match value {
            Value::String(_) => Ok(()),
            _ => Err("must be a string".to_string()),
        },
        FieldKind::Enum(allowed) => match value.as_str() {
            Some(s) if allowed.contains(&s) => Ok(()),
            _ => Err(format!("must be one of: {}", allowed.join(", "))),
        },
    }
}

/// Validate a candidate document, filling defaults and collecting all errors.
pub fn validate(candidate: &Value) -> StoreResult<SettingsDocument> {
    let root = match candidate {
        Value::Object(map) => map,
        _ => {
            return Err(ValidationErrors::single("", "settings must be an object").into());
        }
    };

    let mut errors = ValidationErrors::new();
    let mut out = Map::new();

    for section in SECTIONS {
        let given = match root.get(section) {
            None | Some(Value::Null) => None,
            Some(Value::Object(fields)) => Some(fields),
            Some(_) => {
                errors.push(section, "must be an object");
                continue;
            }
        };

        let mut section_out = Map::new();
        for field in schema::section_fields(section) {
            match given.and_then(|fields| fields.get(field.key)) {
                None => {
                    section_out.insert(field.key.to_string(), field.default.to_json());
                }
                Some(value) => match check_field(field.kind, value) {
                    Ok(()) => {
                        section_out.insert(field.key.to_string(), value.clone());
                    }
                    Err(message) => errors.push(field.path(), message),
                },
            }
        }
        out.insert(section.to_string(), Value::Object(section_out));
    }

    if !errors.is_empty() {
        tracing::debug!(errors = %errors, "Settings candidate rejected");
        return Err(errors.into());
    }

    Ok(serde_json::from_value(Value::Object(out))?)
}

/// Deep-merge a partial document over `current`, section by section.
///
/// Fields of a provided section override the current ones; omitted sections
/// and fields are left untouched. Malformed parts are carried through as-is
/// so `validate` reports them.
pub fn merge(current: &SettingsDocument, patch: &Value) -> StoreResult<Value> {
    let patch = match patch {
        Value::Object(map) => map,
        Value::Null => return Ok(current.to_value()),
        _ => return Err(ValidationErrors::single("", "settings update must be an object").into()),
    };

    let mut merged = current.to_value();
    let Some(root) = merged.as_object_mut() else {
        return Ok(merged);
    };

    for (section, update) in patch {
        match (root.get_mut(section.as_str()), update) {
            (Some(Value::Object(existing)), Value::Object(fields)) => {
                for (key, value) in fields {
                    existing.insert(key.clone(), value.clone());
                }
            }
            (_, Value::Null) => {}
            _ => {
                root.insert(section.clone(), update.clone());
            }
        }
    }

    Ok(merged)
}
