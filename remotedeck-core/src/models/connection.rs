//! Connection profile model representing a saved remote access definition.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use super::protocol::{ConnectionType, ProtocolOptions};
use crate::error::{ConfigError, ConfigResult};

/// Generates a fresh opaque node identifier
#[must_use]
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Accepts `22` as well as `"22"`
fn deserialize_port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid port '{text}'"))),
    }
}

/// A saved remote connection (leaf node of the tree)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProfile {
    /// Unique identifier, opaque
    #[serde(default = "new_id")]
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Remote host address (hostname or IP)
    pub host: String,
    /// Remote port number; older files may store it as a string
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
    /// Username for authentication
    #[serde(default)]
    pub username: String,
    /// Password; ciphertext at rest, plaintext in memory after load
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Tags for organization and filtering
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    /// Timestamp when the profile was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Timestamp when the profile was last modified
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    /// Timestamp when the profile was last launched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_connected: Option<DateTime<Utc>>,
    /// Number of launches
    #[serde(default)]
    pub connection_count: u64,
    /// Type-specific options; carries the `type` tag
    #[serde(flatten)]
    pub options: ProtocolOptions,
}

impl ConnectionProfile {
    /// Creates a new profile with a fresh id and the type's default options
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        connection_type: ConnectionType,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into(),
            host: host.into(),
            port,
            username: String::new(),
            password: String::new(),
            description: None,
            icon: None,
            tags: BTreeSet::new(),
            created_at: now,
            updated_at: now,
            last_connected: None,
            connection_count: 0,
            options: ProtocolOptions::for_type(connection_type),
        }
    }

    /// Sets the username
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Sets the plaintext password
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Replaces the type-specific options (and therefore the type)
    #[must_use]
    pub fn with_options(mut self, options: ProtocolOptions) -> Self {
        self.options = options;
        self
    }

    /// Adds tags
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Returns the connection type
    #[must_use]
    pub const fn connection_type(&self) -> ConnectionType {
        self.options.connection_type()
    }

    /// Updates the `updated_at` timestamp to now
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Records a launch: bumps the counter and sets `last_connected`
    pub fn record_connection(&mut self) {
        self.connection_count = self.connection_count.saturating_add(1);
        self.last_connected = Some(Utc::now());
    }

    /// Returns a copy with a new id and fresh timestamps
    #[must_use]
    pub fn cloned_fresh(&self) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }

    /// Returns true when `(name, host)` identifies the same remote target
    #[must_use]
    pub fn same_target(&self, other: &Self) -> bool {
        self.name == other.name && self.host == other.host
    }

    /// Validates name, host and port
    ///
    /// # Errors
    ///
    /// Returns an error if the name or host is blank or the port is zero.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "name".to_string(),
                reason: "Connection name cannot be empty".to_string(),
            });
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "host".to_string(),
                reason: "Host cannot be empty".to_string(),
            });
        }
        if self.port == 0 {
            return Err(ConfigError::Validation {
                field: "port".to_string(),
                reason: "Port must be between 1 and 65535".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SshOptions;

    #[test]
    fn test_new_profile_timestamps_equal() {
        let profile = ConnectionProfile::new("db1", ConnectionType::Ssh, "10.0.0.1", 22);
        assert_eq!(profile.created_at, profile.updated_at);
        assert_eq!(profile.connection_count, 0);
        assert_eq!(profile.connection_type(), ConnectionType::Ssh);
    }

    #[test]
    fn test_serialized_shape() {
        let profile = ConnectionProfile::new("db1", ConnectionType::Ssh, "10.0.0.1", 22)
            .with_username("root")
            .with_options(ProtocolOptions::Ssh(SshOptions {
                compression: Some(true),
                ..SshOptions::default()
            }));
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["type"], "ssh");
        assert_eq!(json["host"], "10.0.0.1");
        assert_eq!(json["compression"], true);
        assert_eq!(json["connectionCount"], 0);
        assert!(json.get("children").is_none());
    }

    #[test]
    fn test_deserialize_minimal_legacy_profile() {
        let json = r#"{"name":"web","type":"rdp","host":"win01","port":3389,"domain":"CORP"}"#;
        let profile: ConnectionProfile = serde_json::from_str(json).unwrap();
        assert!(!profile.id.is_empty());
        assert_eq!(profile.password, "");
        match profile.options {
            ProtocolOptions::Rdp(rdp) => assert_eq!(rdp.domain.as_deref(), Some("CORP")),
            other => panic!("unexpected options {other:?}"),
        }
    }

    #[test]
    fn test_string_port_is_accepted() {
        let json = r#"{"name":"legacy","type":"ssh","host":"10.0.0.9","port":" 2222 "}"#;
        let profile: ConnectionProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.port, 2222);
        assert_eq!(serde_json::to_value(&profile).unwrap()["port"], 2222);

        let bad = r#"{"name":"legacy","type":"ssh","host":"10.0.0.9","port":"ssh"}"#;
        let err = serde_json::from_str::<ConnectionProfile>(bad).unwrap_err();
        assert!(err.to_string().contains("invalid port"));
    }

    #[test]
    fn test_cloned_fresh_changes_id_only() {
        let profile = ConnectionProfile::new("db1", ConnectionType::Ssh, "10.0.0.1", 22)
            .with_password("secret");
        let copy = profile.cloned_fresh();
        assert_ne!(copy.id, profile.id);
        assert_eq!(copy.password, "secret");
        assert!(copy.same_target(&profile));
    }

    #[test]
    fn test_validate() {
        let mut profile = ConnectionProfile::new("db1", ConnectionType::Ssh, "10.0.0.1", 22);
        assert!(profile.validate().is_ok());
        profile.port = 0;
        assert!(profile.validate().is_err());
        profile.port = 22;
        profile.host = "  ".to_string();
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_record_connection() {
        let mut profile = ConnectionProfile::new("db1", ConnectionType::Telnet, "10.0.0.1", 23);
        profile.record_connection();
        profile.record_connection();
        assert_eq!(profile.connection_count, 2);
        assert!(profile.last_connected.is_some());
    }
}
