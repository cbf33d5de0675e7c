use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{JvibeError, Result};
use crate::layout::SETTINGS_NAMESPACE;

/// The `jvibe` namespace inside `.claude/settings.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stamp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgraded_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// Which timestamp a version write records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampKind {
    Migrated,
    Upgraded,
}

impl StampKind {
    fn key(self) -> &'static str {
        match self {
            Self::Migrated => "migratedAt",
            Self::Upgraded => "upgradedAt",
        }
    }
}

/// Read a settings file, returning an empty object if absent.
/// Valid JSON that is not an object is an error, not an empty map.
pub fn read_settings(path: &Path) -> Result<Map<String, Value>> {
    if path.exists() {
        let data = fs::read_to_string(path)?;
        let val: Value = serde_json::from_str(&data)?;
        match val {
            Value::Object(map) => Ok(map),
            _ => Err(JvibeError::InvalidSettings(path.to_path_buf())),
        }
    } else {
        Ok(Map::new())
    }
}

/// Like [`read_settings`], but a malformed file reads as empty instead of failing.
pub fn read_settings_or_default(path: &Path) -> Result<Map<String, Value>> {
    match read_settings(path) {
        Ok(map) => Ok(map),
        Err(err @ (JvibeError::Json(_) | JvibeError::InvalidSettings(_))) => {
            tracing::warn!(path = %path.display(), %err, "settings unreadable, starting from empty");
            Ok(Map::new())
        }
        Err(other) => Err(other),
    }
}

/// Write settings with pretty formatting.
pub fn write_settings(path: &Path, settings: &Map<String, Value>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&Value::Object(settings.clone()))?;
    fs::write(path, json + "\n")?;
    Ok(())
}

/// Extract the jvibe namespace; a non-object or missing namespace reads as default.
pub fn stamp_of(settings: &Map<String, Value>) -> Stamp {
    settings
        .get(SETTINGS_NAMESPACE)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

/// Merge `version` and a fresh timestamp into the namespace, keeping every other key.
pub fn merge_version(settings: &mut Map<String, Value>, version: &str, kind: StampKind) {
    let ns = settings
        .entry(SETTINGS_NAMESPACE)
        .or_insert_with(|| Value::Object(Map::new()));
    if !ns.is_object() {
        *ns = Value::Object(Map::new());
    }
    if let Value::Object(obj) = ns {
        obj.insert("version".into(), Value::String(version.to_string()));
        obj.insert(kind.key().into(), Value::String(Utc::now().to_rfc3339()));
    }
}

/// Read-merge-write the version stamp. The whole file is rewritten; concurrent
/// hand edits between read and write are lost (last writer wins).
pub fn stamp_version(path: &Path, version: &str, kind: StampKind) -> Result<()> {
    let mut settings = read_settings_or_default(path)?;
    merge_version(&mut settings, version, kind);
    write_settings(path, &settings)
}
