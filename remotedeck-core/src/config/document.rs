//! On-disk document shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ConnectionGroup, CONFIG_VERSION};

/// Producer tag written into exports
pub const EXPORTED_BY: &str = "RemoteDeck";

const PLAINTEXT_NOTE: &str =
    "This file contains plaintext passwords and can be imported on another machine. Keep it safe.";

/// `connections.json`: the tree only, settings live in their own file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConnections {
    #[serde(default = "default_version")]
    pub version: String,
    pub groups: Vec<ConnectionGroup>,
}

/// `connections.json` as read; nodes stay raw until each is checked
#[derive(Debug, Clone, Deserialize)]
pub struct RawConnections {
    #[serde(default = "default_version")]
    pub version: String,
    pub groups: Vec<serde_json::Value>,
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

/// Metadata attached to exports that embed passwords
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportInfo {
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub exported_by: String,
    #[serde(default)]
    pub version: String,
    /// False when passwords are plaintext; importers must not decrypt them
    pub password_encrypted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ExportInfo {
    /// Marker for an export with plaintext passwords
    #[must_use]
    pub fn plaintext(version: &str) -> Self {
        Self {
            exported_at: Utc::now(),
            exported_by: EXPORTED_BY.to_string(),
            version: version.to_string(),
            password_encrypted: false,
            note: Some(PLAINTEXT_NOTE.to_string()),
        }
    }
}

/// Standalone export file: `{version, groups, exportInfo?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(default = "default_version")]
    pub version: String,
    pub groups: Vec<ConnectionGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_info: Option<ExportInfo>,
}

impl ExportDocument {
    /// True when the producer declared the passwords to be plaintext
    #[must_use]
    pub fn declares_plaintext(&self) -> bool {
        self.export_info
            .as_ref()
            .is_some_and(|info| !info.password_encrypted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_without_info_omits_key() {
        let doc = ExportDocument {
            version: CONFIG_VERSION.to_string(),
            groups: Vec::new(),
            export_info: None,
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("exportInfo").is_none());
        assert!(json.get("settings").is_none());
        assert!(!doc.declares_plaintext());
    }

    #[test]
    fn test_plaintext_marker() {
        let doc = ExportDocument {
            version: CONFIG_VERSION.to_string(),
            groups: Vec::new(),
            export_info: Some(ExportInfo::plaintext(CONFIG_VERSION)),
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["exportInfo"]["passwordEncrypted"], false);
        assert_eq!(json["exportInfo"]["exportedBy"], EXPORTED_BY);
        assert!(doc.declares_plaintext());
    }
}
