//! Settings document: the nested domain shape handed to the UI layer.
//!
//! JSON form uses camelCase field names grouped by section:
//! `{"theme": {"type": "system", ...}, "system": {...}, "updater": {...}}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeType {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemeType {
    pub const ALL: [&'static str; 3] = ["light", "dark", "system"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for ThemeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ThemeType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            _ => Err(format!("Unknown theme type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum DatesLocale {
    #[default]
    #[serde(rename = "nl-NL")]
    NlNl,
    #[serde(rename = "us-US")]
    UsUs,
}

impl DatesLocale {
    pub const ALL: [&'static str; 2] = ["nl-NL", "us-US"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NlNl => "nl-NL",
            Self::UsUs => "us-US",
        }
    }
}

impl std::fmt::Display for DatesLocale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DatesLocale {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nl-NL" => Ok(Self::NlNl),
            "us-US" => Ok(Self::UsUs),
            _ => Err(format!("Unknown dates locale: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSettings {
    #[serde(rename = "type")]
    pub theme_type: ThemeType,
    pub dates_locale: DatesLocale,
    pub sidebar_open: bool,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            theme_type: ThemeType::System,
            dates_locale: DatesLocale::NlNl,
            sidebar_open: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SystemSettings {
    pub show_tray_icon: bool,
    pub minimize_to_tray: bool,
    pub start_in_tray: bool,
    pub start_with_system: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdaterSettings {
    pub check_automatically: bool,
    pub download_automatically: bool,
    pub install_automatically: bool,
}

impl Default for UpdaterSettings {
    fn default() -> Self {
        Self {
            check_automatically: true,
            download_automatically: false,
            install_automatically: false,
        }
    }
}

/// Fully populated settings. Every field is always present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsDocument {
    pub theme: ThemeSettings,
    pub system: SystemSettings,
    pub updater: UpdaterSettings,
}

impl SettingsDocument {
    pub fn to_value(&self) -> serde_json::Value {
        // Plain structs of enums/bools cannot fail to serialize.
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}

impl From<&SettingsDocument> for serde_json::Value {
    fn from(doc: &SettingsDocument) -> Self {
        doc.to_value()
    }
}

// ── Partial updates ──

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThemePatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub theme_type: Option<ThemeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates_locale: Option<DatesLocale>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidebar_open: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SystemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_tray_icon: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimize_to_tray: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_in_tray: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_with_system: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdaterPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_automatically: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_automatically: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_automatically: Option<bool>,
}

/// Typed partial document. Omitted sections and fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemePatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updater: Option<UpdaterPatch>,
}

impl SettingsPatch {
    pub fn theme(patch: ThemePatch) -> Self {
        Self {
            theme: Some(patch),
            ..Self::default()
        }
    }

    pub fn system(patch: SystemPatch) -> Self {
        Self {
            system: Some(patch),
            ..Self::default()
        }
    }

    pub fn updater(patch: UpdaterPatch) -> Self {
        Self {
            updater: Some(patch),
            ..Self::default()
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}

impl From<&SettingsPatch> for serde_json::Value {
    fn from(patch: &SettingsPatch) -> Self {
        patch.to_value()
    }
}
