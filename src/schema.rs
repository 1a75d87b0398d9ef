//! Schema definition: one static field table for the settings document.
//!
//! The table drives defaults, validation, the persisted column list and the
//! nested <-> flat mapping. Schema changes are append-only: a new field gets a
//! default and a new migration, existing names are never repurposed.

use rusqlite::types::Value as SqlValue;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::settings::{
    DatesLocale, SettingsDocument, SystemSettings, ThemeSettings, ThemeType, UpdaterSettings,
};

/// Sections of the nested document, in persisted column order.
pub const SECTIONS: [&str; 3] = ["theme", "system", "updater"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Text restricted to a fixed set of values.
    Enum(&'static [&'static str]),
    Bool,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Bool(bool),
    Str(&'static str),
}

impl FieldDefault {
    pub fn to_json(self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(b),
            Self::Str(s) => serde_json::Value::String(s.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub section: &'static str,
    /// camelCase name inside the section
    pub key: &'static str,
    /// snake_case column of the flat record (`section_field`)
    pub column: &'static str,
    pub kind: FieldKind,
    pub default: FieldDefault,
}

impl FieldSpec {
    /// Dotted domain path, as reported in validation errors.
    pub fn path(&self) -> String {
        format!("{}.{}", self.section, self.key)
    }
}

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        section: "theme",
        key: "type",
        column: "theme_type",
        kind: FieldKind::Enum(&ThemeType::ALL),
        default: FieldDefault::Str("system"),
    },
    FieldSpec {
        section: "theme",
        key: "datesLocale",
        column: "theme_dates_locale",
        kind: FieldKind::Enum(&DatesLocale::ALL),
        default: FieldDefault::Str("nl-NL"),
    },
    FieldSpec {
        section: "theme",
        key: "sidebarOpen",
        column: "theme_sidebar_open",
        kind: FieldKind::Bool,
        default: FieldDefault::Bool(true),
    },
    FieldSpec {
        section: "system",
        key: "showTrayIcon",
        column: "system_show_tray_icon",
        kind: FieldKind::Bool,
        default: FieldDefault::Bool(false),
    },
    FieldSpec {
        section: "system",
        key: "minimizeToTray",
        column: "system_minimize_to_tray",
        kind: FieldKind::Bool,
        default: FieldDefault::Bool(false),
    },
    FieldSpec {
        section: "system",
        key: "startInTray",
        column: "system_start_in_tray",
        kind: FieldKind::Bool,
        default: FieldDefault::Bool(false),
    },
    FieldSpec {
        section: "system",
        key: "startWithSystem",
        column: "system_start_with_system",
        kind: FieldKind::Bool,
        default: FieldDefault::Bool(false),
    },
    FieldSpec {
        section: "updater",
        key: "checkAutomatically",
        column: "updater_check_automatically",
        kind: FieldKind::Bool,
        default: FieldDefault::Bool(true),
    },
    FieldSpec {
        section: "updater",
        key: "downloadAutomatically",
        column: "updater_download_automatically",
        kind: FieldKind::Bool,
        default: FieldDefault::Bool(false),
    },
    FieldSpec {
        section: "updater",
        key: "installAutomatically",
        column: "updater_install_automatically",
        kind: FieldKind::Bool,
        default: FieldDefault::Bool(false),
    },
];

/// Fields of one section, in table order.
pub fn section_fields(section: &str) -> impl Iterator<Item = &'static FieldSpec> + '_ {
    FIELDS.iter().filter(move |f| f.section == section)
}

pub fn find_field(section: &str, key: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.section == section && f.key == key)
}

/// Schema defaults as a typed document.
pub fn defaults() -> SettingsDocument {
    SettingsDocument {
        theme: ThemeSettings::default(),
        system: SystemSettings::default(),
        updater: UpdaterSettings::default(),
    }
}

/// The flat, persisted shape: one value per leaf field, no id or timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatSettingsRecord {
    pub theme_type: ThemeType,
    pub theme_dates_locale: DatesLocale,
    pub theme_sidebar_open: bool,
    pub system_show_tray_icon: bool,
    pub system_minimize_to_tray: bool,
    pub system_start_in_tray: bool,
    pub system_start_with_system: bool,
    pub updater_check_automatically: bool,
    pub updater_download_automatically: bool,
    pub updater_install_automatically: bool,
}

pub fn to_flat(doc: &SettingsDocument) -> FlatSettingsRecord {
    FlatSettingsRecord {
        theme_type: doc.theme.theme_type,
        theme_dates_locale: doc.theme.dates_locale,
        theme_sidebar_open: doc.theme.sidebar_open,
        system_show_tray_icon: doc.system.show_tray_icon,
        system_minimize_to_tray: doc.system.minimize_to_tray,
        system_start_in_tray: doc.system.start_in_tray,
        system_start_with_system: doc.system.start_with_system,
        updater_check_automatically: doc.updater.check_automatically,
        updater_download_automatically: doc.updater.download_automatically,
        updater_install_automatically: doc.updater.install_automatically,
    }
}

pub fn from_flat(rec: &FlatSettingsRecord) -> SettingsDocument {
    SettingsDocument {
        theme: ThemeSettings {
            theme_type: rec.theme_type,
            dates_locale: rec.theme_dates_locale,
            sidebar_open: rec.theme_sidebar_open,
        },
        system: SystemSettings {
            show_tray_icon: rec.system_show_tray_icon,
            minimize_to_tray: rec.system_minimize_to_tray,
            start_in_tray: rec.system_start_in_tray,
            start_with_system: rec.system_start_with_system,
        },
        updater: UpdaterSettings {
            check_automatically: rec.updater_check_automatically,
            download_automatically: rec.updater_download_automatically,
            install_automatically: rec.updater_install_automatically,
        },
    }
}

fn sql_bool(b: bool) -> SqlValue {
    SqlValue::Integer(b as i64)
}

fn sql_text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

fn parse_column<T>(row: &Row, column: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let idx = row.as_ref().column_index(column)?;
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::<dyn std::error::Error + Send + Sync>::from(e),
        )
    })
}

impl FlatSettingsRecord {
    /// `(column, value)` pairs in `FIELDS` order, ready to bind.
    pub fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("theme_type", sql_text(self.theme_type.as_str())),
            ("theme_dates_locale", sql_text(self.theme_dates_locale.as_str())),
            ("theme_sidebar_open", sql_bool(self.theme_sidebar_open)),
            ("system_show_tray_icon", sql_bool(self.system_show_tray_icon)),
            ("system_minimize_to_tray", sql_bool(self.system_minimize_to_tray)),
            ("system_start_in_tray", sql_bool(self.system_start_in_tray)),
            ("system_start_with_system", sql_bool(self.system_start_with_system)),
            ("updater_check_automatically", sql_bool(self.updater_check_automatically)),
            ("updater_download_automatically", sql_bool(self.updater_download_automatically)),
            ("updater_install_automatically", sql_bool(self.updater_install_automatically)),
        ]
    }

    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            theme_type: parse_column(row, "theme_type")?,
            theme_dates_locale: parse_column(row, "theme_dates_locale")?,
            theme_sidebar_open: row.get("theme_sidebar_open")?,
            system_show_tray_icon: row.get("system_show_tray_icon")?,
            system_minimize_to_tray: row.get("system_minimize_to_tray")?,
            system_start_in_tray: row.get("system_start_in_tray")?,
            system_start_with_system: row.get("system_start_with_system")?,
            updater_check_automatically: row.get("updater_check_automatically")?,
            updater_download_automatically: row.get("updater_download_automatically")?,
            updater_install_automatically: row.get("updater_install_automatically")?,
        })
    }
}
