//! Application settings model
//!
//! This module defines the settings stored in `settings.json`. Stored keys
//! are laid over the defaults one at a time, so a missing key is backfilled,
//! a bad value only costs that key, and unknown keys survive a save.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::ConnectionType;

/// Color theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    /// Follow the desktop
    #[default]
    Auto,
}

/// UI language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "zh-CN")]
    ZhCn,
    #[serde(rename = "en-US")]
    EnUs,
}

/// One external program integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Display name
    pub name: String,
    /// Logical executable key; decides which connection types it serves
    pub executable: String,
    /// Path to the binary; a bare name is looked up on `PATH`
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub enabled: bool,
    /// Argument template with `{host}`-style placeholders
    #[serde(default, alias = "arguments", skip_serializing_if = "Option::is_none")]
    pub arguments_template: Option<String>,
}

impl ClientConfig {
    /// Creates an enabled client
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        executable: impl Into<String>,
        path: impl Into<String>,
        arguments_template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            executable: executable.into(),
            path: path.into(),
            enabled: true,
            arguments_template: Some(arguments_template.into()),
        }
    }

    /// True when enabled and a path is configured
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.path.trim().is_empty()
    }

    /// Path with `~` and `$VAR` expanded
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        let path = self.path.trim();
        PathBuf::from(
            shellexpand::full(path).map_or_else(|_| path.to_string(), |s| s.into_owned()),
        )
    }
}

/// Application-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct AppSettings {
    pub theme: Theme,
    pub language: Language,
    pub auto_save: bool,
    pub confirm_before_delete: bool,
    pub show_connection_count: bool,
    /// Type preselected for new profiles
    pub default_connection_type: ConnectionType,
    pub encryption_enabled: bool,
    pub backup_enabled: bool,
    /// Hours between automatic backups
    pub backup_interval: u32,
    /// Client table keyed by client key (`ssh`, `mstsc`, ...); seeded on
    /// first launch when empty
    pub client_paths: BTreeMap<String, ClientConfig>,
    /// Keys this version does not know; written back unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const CLIENT_PATHS_KEY: &str = "clientPaths";

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Auto,
            language: Language::ZhCn,
            auto_save: true,
            confirm_before_delete: true,
            show_connection_count: true,
            default_connection_type: ConnectionType::Ssh,
            encryption_enabled: true,
            backup_enabled: true,
            backup_interval: 24,
            client_paths: BTreeMap::new(),
            extra: Map::new(),
        }
    }
}

impl AppSettings {
    /// Lays stored settings over the defaults one key at a time
    ///
    /// A key whose value does not fit keeps its default and is named in the
    /// returned list. Client entries are checked one by one.
    #[must_use]
    pub fn merge_stored(stored: Map<String, Value>) -> (Self, Vec<String>) {
        let defaults = Self::default();
        let mut merged = match serde_json::to_value(&defaults) {
            Ok(Value::Object(map)) => map,
            _ => return (defaults, Vec::new()),
        };

        let mut rejected = Vec::new();
        for (key, value) in stored {
            let value = if key == CLIENT_PATHS_KEY {
                retain_valid_clients(value, &mut rejected)
            } else {
                value
            };
            let previous = merged.insert(key.clone(), value);
            if serde_json::from_value::<Self>(Value::Object(merged.clone())).is_err() {
                match previous {
                    Some(previous) => merged.insert(key.clone(), previous),
                    None => merged.remove(&key),
                };
                rejected.push(key);
            }
        }

        let settings = serde_json::from_value(Value::Object(merged)).unwrap_or(defaults);
        (settings, rejected)
    }
}

fn retain_valid_clients(value: Value, rejected: &mut Vec<String>) -> Value {
    let Value::Object(clients) = value else {
        return value;
    };
    let kept = clients
        .into_iter()
        .filter(|(key, client)| {
            let valid = serde_json::from_value::<ClientConfig>(client.clone()).is_ok();
            if !valid {
                rejected.push(format!("{CLIENT_PATHS_KEY}.{key}"));
            }
            valid
        })
        .collect();
    Value::Object(kept)
}
